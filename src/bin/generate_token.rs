//! CLI token issuance for API access.
//!
//! Usage: generate-token --username <name> --secret-word <word>
//!
//! Reads the same configuration as the server, so the printed token validates
//! against the running instance.

use boxd::config::Config;
use boxd::services::AuthService;

fn usage() -> ! {
    eprintln!("Usage: generate-token --username <name> --secret-word <word>");
    std::process::exit(2);
}

fn parse_args() -> (String, String) {
    let mut username = None;
    let mut secret_word = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--username" => username = args.next(),
            "--secret-word" => secret_word = args.next(),
            _ => usage(),
        }
    }

    match (username, secret_word) {
        (Some(u), Some(s)) => (u, s),
        _ => usage(),
    }
}

fn main() {
    let (username, secret_word) = parse_args();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let auth = AuthService::new(
        config.auth.jwt_secret,
        config.letterboxd.username,
        config.auth.secret_word,
    );

    match auth.issue(&username, &secret_word) {
        Ok(token) => {
            println!("Your Bearer Token:");
            println!("{}", token);
            println!();
            println!("Use this token in your Authorization header:");
            println!("Authorization: Bearer {}", token);
        }
        Err(e) => {
            eprintln!("Error generating token: {}", e);
            std::process::exit(1);
        }
    }
}
