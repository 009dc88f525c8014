use super::{fail, print_json};
use homotally::{generate_parameters, GroupParameters, DEFAULT_BIT_STRENGTH};

pub fn command_params(matches: &clap::ArgMatches) {
    if let Some(matches) = matches.subcommand_matches("generate") {
        command_params_generate(matches);
    }
}

pub fn command_params_generate(matches: &clap::ArgMatches) {
    let params = if matches.is_present("fixed") {
        GroupParameters::rfc3526_2048()
    } else {
        let bits = match matches.value_of("bits") {
            Some(bits) => bits
                .parse()
                .unwrap_or_else(|_| fail("params", format!("invalid --bits {}", bits))),
            None => DEFAULT_BIT_STRENGTH,
        };
        generate_parameters(bits)
    };

    let params = params.unwrap_or_else(|e| fail("params", e));
    print_json("params", &params);
}
