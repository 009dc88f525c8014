use super::{expand, fail, print_json, read_json};
use homotally::{generate_key_pair, GroupParameters};

pub fn command_keygen(matches: &clap::ArgMatches) {
    let params: GroupParameters = read_json("keygen", matches.value_of("params").unwrap_or_default());
    let secret_file = expand("keygen", matches.value_of("secret").unwrap_or_default());

    let keypair = generate_key_pair(&params).unwrap_or_else(|e| fail("keygen", e));

    // Only the private exponent goes to disk; the public key goes to stdout
    if let Err(e) = std::fs::write(&secret_file, keypair.private.to_decimal()) {
        fail("keygen", format!("unable to write {}: {}", secret_file, e));
    }

    print_json("keygen", &keypair.public);
}
