use clap::{App, AppSettings, Arg, SubCommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;

mod command_combine;
mod command_decrypt;
mod command_e2e;
mod command_encrypt;
mod command_keygen;
mod command_params;

use command_combine::command_combine;
use command_decrypt::command_decrypt;
use command_e2e::command_e2e;
use command_encrypt::command_encrypt;
use command_keygen::command_keygen;
use command_params::command_params;

fn main() {
    let params_arg = Arg::with_name("params")
        .long("params")
        .value_name("FILE")
        .takes_value(true)
        .required(true)
        .help("Group parameters file in JSON format");

    let matches = App::new("Homotally CLI")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encrypts, combines and decrypts homomorphic ElGamal votes")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            SubCommand::with_name("params")
                .about("Group parameters")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("generate")
                        .about("Generate or select group parameters")
                        .arg(
                            Arg::with_name("bits")
                                .long("bits")
                                .value_name("N")
                                .takes_value(true)
                                .default_value("2048")
                                .help("Size of the safe prime to generate"),
                        )
                        .arg(
                            Arg::with_name("fixed")
                                .long("fixed")
                                .help("Use the RFC 3526 2048-bit group instead of generating one"),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Generate an election key pair")
                .arg(params_arg.clone())
                .arg(
                    Arg::with_name("secret")
                        .long("secret")
                        .value_name("FILE")
                        .takes_value(true)
                        .required(true)
                        .help("File to write the private exponent to"),
                ),
        )
        .subcommand(
            SubCommand::with_name("encrypt")
                .about("Encrypt a vote")
                .arg(params_arg.clone())
                .arg(
                    Arg::with_name("public")
                        .long("public")
                        .value_name("FILE")
                        .takes_value(true)
                        .required(true)
                        .help("Public key file in JSON format"),
                )
                .arg(
                    Arg::with_name("exponential")
                        .long("exponential")
                        .help("Encrypt g^VOTE so that combined ciphertexts add up votes"),
                )
                .arg(
                    Arg::with_name("VOTE")
                        .index(1)
                        .required(true)
                        .help("The vote as a decimal integer"),
                ),
        )
        .subcommand(
            SubCommand::with_name("combine")
                .about("Combine ciphertexts into an aggregate")
                .arg(params_arg.clone())
                .arg(
                    Arg::with_name("INPUT")
                        .index(1)
                        .required(true)
                        .help("JSON array of ciphertexts"),
                ),
        )
        .subcommand(
            SubCommand::with_name("decrypt")
                .about("Decrypt an aggregate ciphertext")
                .arg(params_arg)
                .arg(
                    Arg::with_name("secret")
                        .long("secret")
                        .value_name("FILE")
                        .takes_value(true)
                        .required(true)
                        .help("File holding the private exponent"),
                )
                .arg(
                    Arg::with_name("max-count")
                        .long("max-count")
                        .value_name("N")
                        .takes_value(true)
                        .help("Recover a count of exponentially encoded votes, up to N"),
                )
                .arg(
                    Arg::with_name("INPUT")
                        .index(1)
                        .required(true)
                        .help("Aggregate ciphertext in JSON format"),
                ),
        )
        .subcommand(
            SubCommand::with_name("e2e")
                .about("Run a complete mock election configured by HOMOTALLY_* variables")
                .arg(
                    Arg::with_name("voters")
                        .long("voters")
                        .value_name("N")
                        .takes_value(true)
                        .default_value("10")
                        .help("Number of mock voters"),
                ),
        )
        .get_matches();

    let level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    init_logging(level);

    // Subcommands
    match matches.subcommand() {
        ("params", Some(matches)) => command_params(matches),
        ("keygen", Some(matches)) => command_keygen(matches),
        ("encrypt", Some(matches)) => command_encrypt(matches),
        ("combine", Some(matches)) => command_combine(matches),
        ("decrypt", Some(matches)) => command_decrypt(matches),
        ("e2e", Some(matches)) => command_e2e(matches),
        (other, _) => fail(other, "unknown command"),
    }
}

/// Use `log4rs.yaml` from the working directory if there is one, otherwise log to stderr.
fn init_logging(level: LevelFilter) {
    if Path::new("log4rs.yaml").exists() {
        if let Err(e) = log4rs::init_file("log4rs.yaml", Default::default()) {
            eprintln!("homotally: unable to load log4rs.yaml: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l})} {t} - {m}{n}")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));

    let result = config
        .map_err(|e| e.to_string())
        .and_then(|config| log4rs::init_config(config).map(|_| ()).map_err(|e| e.to_string()));
    if let Err(e) = result {
        eprintln!("homotally: unable to initialise logging: {}", e);
        std::process::exit(1);
    }
}

/// Print `homotally <command>: <message>` and exit with status 1
pub fn fail(command: &str, message: impl Display) -> ! {
    eprintln!("homotally {}: {}", command, message);
    std::process::exit(1);
}

/// Expand `~` and environment variables in a path given on the command line
pub fn expand(command: &str, input: &str) -> String {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|e| fail(command, e))
}

/// Read and parse a JSON file named on the command line
pub fn read_json<T: DeserializeOwned>(command: &str, filename: &str) -> T {
    let filename = expand(command, filename);
    let bytes = std::fs::read(&filename)
        .unwrap_or_else(|e| fail(command, format!("unable to read {}: {}", filename, e)));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| fail(command, format!("unable to parse {}: {}", filename, e)))
}

/// Print a value to stdout as pretty JSON
pub fn print_json<T: Serialize>(command: &str, value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(command, e));
    println!("{}", json);
}
