// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

//! Decodes a single Syndie enclosure file from the command line and prints
//! its first page to stdout.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use syndie_codec::{DecodeConfig, DecodeOptions};

/// Decode a Syndie enclosure file and print its first page.
#[derive(Parser, Debug)]
#[command(name = "syndie-cli", version, about)]
struct Args {
    /// Path to the enclosure file to decode.
    file: PathBuf,

    /// I2P-base64 AES-256 body key. Overrides any `body_key` in `--config`.
    #[arg(long)]
    key: Option<String>,

    /// Path to a TOML config file (see `DecodeConfig`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip signature-line verification.
    #[arg(long)]
    insecure_skip_signature: bool,

    /// Skip HMAC verification. Never use this outside debugging.
    #[arg(long)]
    insecure_skip_hmac: bool,
}

fn load_options(args: &Args) -> Result<DecodeOptions> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            DecodeConfig::from_toml_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => DecodeConfig::default(),
    };

    let mut options = config
        .into_options(args.key.clone())
        .context("resolving decode options")?;
    if args.insecure_skip_signature {
        options.require_signature_verification = false;
    }
    if args.insecure_skip_hmac {
        options.require_hmac = false;
    }
    Ok(options)
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let args = Args::parse();
    let options = load_options(&args)?;

    let file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;

    match syndie_codec::decode(file, &options) {
        Ok(message) => {
            info!(pages = message.pages.len(), attachments = message.attachments.len(), "decoded enclosure");
            match message.pages.first() {
                Some(page) => println!("{}", page.data),
                None => println!("(no pages)"),
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "failed to decode enclosure");
            std::process::exit(1);
        }
    }
}
