use super::{fail, print_json, read_json};
use homotally::{combine_parallel, Ciphertext, GroupParameters};
use log::info;

pub fn command_combine(matches: &clap::ArgMatches) {
    let params: GroupParameters = read_json("combine", matches.value_of("params").unwrap_or_default());
    let ciphertexts: Vec<Ciphertext> =
        read_json("combine", matches.value_of("INPUT").unwrap_or_default());

    let aggregate = combine_parallel(&ciphertexts, &params).unwrap_or_else(|e| fail("combine", e));
    info!("combined {} ciphertexts", ciphertexts.len());

    print_json("combine", &aggregate);
}
