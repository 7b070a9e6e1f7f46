//! Model signing utility for cardioscreen artifacts.
//!
//! Writes a manifest (`manifest.json`) binding the model artifact by SHA-256,
//! and a detached Ed25519 signature over it (`model.sig`).
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_model -- keygen --out <seed_file>
//! cargo run --bin sign_model -- sign <model_dir|artifact> --seed <seed_file>
//! ```
//!
//! `keygen` prints the base64 public key to put in `CARDIOSCREEN_MODEL_PUBKEY_B64`.
//! The seed file holds the base64 32-byte private seed; keep it out of the
//! model directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardioscreen::adapters::artifact::sign_artifact;

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Keygen { out: PathBuf },
    Sign { model_path: PathBuf, seed: PathBuf },
}

fn usage() -> String {
    "Usage:\n  sign_model keygen --out <seed_file>\n  sign_model sign <model_dir|artifact> --seed <seed_file>"
        .to_string()
}

fn parse_args() -> Result<Command, String> {
    let mut args = env::args().skip(1);
    let command = args.next().ok_or_else(usage)?;

    let mut positional: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut seed: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "--seed" => seed = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "-h" | "--help" => return Err(usage()),
            _ if positional.is_none() => positional = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    match command.as_str() {
        "keygen" => Ok(Command::Keygen {
            out: out.ok_or_else(usage)?,
        }),
        "sign" => Ok(Command::Sign {
            model_path: positional.ok_or_else(usage)?,
            seed: seed.ok_or_else(usage)?,
        }),
        _ => Err(usage()),
    }
}

fn read_seed(path: &Path) -> Result<Seed, String> {
    let content = Zeroizing::new(
        fs::read_to_string(path).map_err(|e| format!("Failed reading seed file {path:?}: {e}"))?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| format!("Invalid base64 in seed file: {e}"))?,
    );
    if raw.len() != 32 {
        return Err(format!(
            "Seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        ));
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn keygen(out: &Path) -> Result<(), String> {
    if out.exists() {
        return Err(format!("Refusing to overwrite existing seed file {out:?}"));
    }

    let mut seed = Seed([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut seed.0);
    let signing_key = SigningKey::from_bytes(&seed.0);

    let encoded = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    fs::write(out, encoded.as_bytes()).map_err(|e| format!("Failed to write {out:?}: {e}"))?;

    println!("Wrote signing seed: {out:?}");
    println!(
        "CARDIOSCREEN_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn sign(model_path: &Path, seed_path: &Path) -> Result<(), String> {
    let seed = read_seed(seed_path)?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let (manifest_path, sig_path) =
        sign_artifact(model_path, &signing_key).map_err(|e| e.to_string())?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Public key (base64): {}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn main() -> Result<(), String> {
    match parse_args()? {
        Command::Keygen { out } => keygen(&out),
        Command::Sign { model_path, seed } => sign(&model_path, &seed),
    }
}
