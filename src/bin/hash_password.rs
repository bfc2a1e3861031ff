//! Prints an argon2 hash suitable for ADMIN_PASSWORD_HASH.

use clap::Parser;
use quiz_backend::utils::crypto::hash_password;

#[derive(Parser, Debug)]
#[command(name = "hash-password")]
struct Cli {
    password: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    println!("{}", hash_password(&cli.password)?);
    Ok(())
}
