use std::env;
use std::net::SocketAddr;

use contracts::{Command, CommandPayload, CommandType, CoordinatorConfig, Position};
use pact_api::{serve, CoordinatorApi};

fn print_usage() {
    println!("pact-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  simulate [offer_expiry_ms]");
    println!("    runs the two-player pact scenario deterministically and prints the transcript");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_expiry_ms(value: Option<&String>) -> Result<u64, String> {
    match value {
        None => Ok(CoordinatorConfig::default().offer_expiry_ms),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("invalid offer_expiry_ms: {raw}")),
    }
}

fn submit(api: &mut CoordinatorApi, label: &str, command: Command) {
    let result = api.submit_command(command);
    if result.accepted {
        println!("[command] {label}: accepted");
    } else {
        let reason = result
            .error
            .map(|error| error.message)
            .unwrap_or_else(|| "unknown".to_string());
        println!("[command] {label}: rejected ({reason})");
    }
}

fn print_inboxes(api: &mut CoordinatorApi, stage: &str) {
    println!("-- {stage} --");
    for (id, name) in [("uid-alice", "Alice"), ("uid-bob", "Bob")] {
        for message in api.drain_participant_inbox(id) {
            for line in message.lines() {
                println!("[chat -> {name}] {line}");
            }
        }
    }
}

fn run_scenario(args: &[String]) -> Result<(), String> {
    let offer_expiry_ms = parse_expiry_ms(args.get(2))?;
    let config = CoordinatorConfig {
        offer_expiry_ms,
        ..CoordinatorConfig::default()
    };
    let mut api = CoordinatorApi::from_config(config);

    let joins = [
        ("uid-alice", "Alice", Position::new(12.0, 64.0, -7.0)),
        ("uid-bob", "Bob", Position::new(240.0, 70.0, 31.0)),
    ];
    for (id, name, position) in joins {
        submit(
            &mut api,
            &format!("join {name}"),
            Command::new(
                format!("cmd-join-{id}"),
                0,
                CommandType::InjectJoin,
                CommandPayload::InjectJoin {
                    participant_id: id.to_string(),
                    display_name: name.to_string(),
                    position,
                    bonus_health: 0.0,
                },
            ),
        );
    }

    submit(
        &mut api,
        "/pact Bob (from Alice)",
        Command::new(
            "cmd-pact-alice",
            0,
            CommandType::PactRequest,
            CommandPayload::PactRequest {
                requester_id: "uid-alice".to_string(),
                args: vec!["Bob".to_string()],
            },
        ),
    );
    submit(
        &mut api,
        "/pact Alice (from Bob)",
        Command::new(
            "cmd-pact-bob",
            0,
            CommandType::PactRequest,
            CommandPayload::PactRequest {
                requester_id: "uid-bob".to_string(),
                args: vec!["Alice".to_string()],
            },
        ),
    );
    print_inboxes(&mut api, "after mutual offers");

    submit(
        &mut api,
        "revive Alice",
        Command::new(
            "cmd-revive-alice",
            0,
            CommandType::InjectRevive,
            CommandPayload::InjectRevive {
                participant_id: "uid-alice".to_string(),
            },
        ),
    );
    submit(
        &mut api,
        "revive Bob",
        Command::new(
            "cmd-revive-bob",
            0,
            CommandType::InjectRevive,
            CommandPayload::InjectRevive {
                participant_id: "uid-bob".to_string(),
            },
        ),
    );
    print_inboxes(&mut api, "after both revives");

    for broadcast in api.broadcasts() {
        println!("[broadcast] {broadcast}");
    }

    println!("-- timeline --");
    for event in api.events() {
        let actors = event
            .actors
            .iter()
            .map(|actor| actor.actor_id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{} at={}ms {:?} actors=[{actors}]",
            event.event_id, event.at_ms, event.event_type
        );
    }

    println!("{}", api.status());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving pact coordinator api on http://{addr}");
                if let Err(err) = serve(addr, CoordinatorConfig::default()).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("simulate") => {
            if let Err(err) = run_scenario(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
