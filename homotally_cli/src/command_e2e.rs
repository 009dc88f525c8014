use super::{fail, print_json};
use homotally::*;
use log::{debug, info};
use rand::Rng;

pub fn command_e2e(matches: &clap::ArgMatches) {
    let num_voters: usize = match matches.value_of("voters") {
        Some(n) => n
            .parse()
            .unwrap_or_else(|_| fail("e2e", format!("invalid --voters {}", n))),
        None => 10,
    };

    let config = ElectionConfig::from_env().unwrap_or_else(|e| fail("e2e", e));
    let (election, authority) =
        setup_election(&config, MemStore::new()).unwrap_or_else(|e| fail("e2e", e));

    // Register the mock voters
    let voters: Vec<String> = (0..num_voters).map(|i| format!("voter-{}", i)).collect();
    let registry: EligibilityRegistry = voters.iter().cloned().collect();

    // Each voter picks a random candidate
    let mut rng = rand::thread_rng();
    for voter in &voters {
        let choice = rng.gen_range(0..election.candidates().len());
        let ballot = election
            .cast_vote(&registry, voter, choice)
            .unwrap_or_else(|e| fail("e2e", e));
        debug!("{} cast ballot {} receipt {}", voter, ballot.id, ballot.receipt());
    }
    info!("{} of {} voters cast a ballot", registry.turnout(), registry.len());

    let result = election
        .request_tally(&authority)
        .unwrap_or_else(|e| fail("e2e", e));

    print_json("e2e", &result);
}
