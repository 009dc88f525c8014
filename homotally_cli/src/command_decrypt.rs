use super::{expand, fail, print_json, read_json};
use homotally::{parse_decimal, Ciphertext, DecryptionAuthority, GroupParameters, PrivateKey};

pub fn command_decrypt(matches: &clap::ArgMatches) {
    let params: GroupParameters = read_json("decrypt", matches.value_of("params").unwrap_or_default());
    let aggregate: Ciphertext = read_json("decrypt", matches.value_of("INPUT").unwrap_or_default());

    let secret_file = expand("decrypt", matches.value_of("secret").unwrap_or_default());
    let secret = std::fs::read_to_string(&secret_file)
        .unwrap_or_else(|e| fail("decrypt", format!("unable to read {}: {}", secret_file, e)));
    let exponent = parse_decimal(&secret)
        .unwrap_or_else(|e| fail("decrypt", format!("invalid secret in {}: {}", secret_file, e)));

    let private_key = PrivateKey::new(&params, exponent).unwrap_or_else(|e| fail("decrypt", e));
    let authority = DecryptionAuthority::new(params, private_key).unwrap_or_else(|e| fail("decrypt", e));

    match matches.value_of("max-count") {
        Some(max) => {
            let max: u64 = max
                .parse()
                .unwrap_or_else(|_| fail("decrypt", format!("invalid --max-count {}", max)));
            let count = authority
                .decrypt_count(&aggregate, max)
                .unwrap_or_else(|e| fail("decrypt", e));
            print_json("decrypt", &count);
        }
        None => {
            let plaintext = authority
                .decrypt(&aggregate)
                .unwrap_or_else(|e| fail("decrypt", e));
            print_json("decrypt", &plaintext.to_str_radix(10));
        }
    }
}
