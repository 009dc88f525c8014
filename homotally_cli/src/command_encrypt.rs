use super::{fail, print_json, read_json};
use homotally::{encrypt, encrypt_exponential, parse_decimal, GroupParameters, PublicKey};

pub fn command_encrypt(matches: &clap::ArgMatches) {
    let params: GroupParameters = read_json("encrypt", matches.value_of("params").unwrap_or_default());
    let public: PublicKey = read_json("encrypt", matches.value_of("public").unwrap_or_default());
    let public = PublicKey::new(&params, public.value().clone()).unwrap_or_else(|e| fail("encrypt", e));

    let vote = matches.value_of("VOTE").unwrap_or_default();

    let ciphertext = if matches.is_present("exponential") {
        let vote: u64 = vote
            .trim()
            .parse()
            .unwrap_or_else(|_| fail("encrypt", format!("invalid vote {}", vote)));
        encrypt_exponential(vote, &params, &public)
    } else {
        let vote = parse_decimal(vote).unwrap_or_else(|e| fail("encrypt", e));
        encrypt(&vote, &params, &public)
    };

    let ciphertext = ciphertext.unwrap_or_else(|e| fail("encrypt", e));
    print_json("encrypt", &ciphertext);
}
