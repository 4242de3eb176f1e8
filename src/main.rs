//! Pathology lab cart command-line front end

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use pathlab_cart::{
    cart::Cart,
    catalog::Catalog,
    session::{PatientId, StaticSession},
    storage::FileStore,
    summary::parse_currency,
};

use crate::{
    commands::{CommandContext, run},
    config::CliConfig,
};

mod commands;
mod config;
mod logging;

fn main() -> Result<()> {
    let config = CliConfig::parse();

    logging::init(&config.logging)?;

    let catalog = Catalog::load(&config.store.catalog).with_context(|| {
        format!(
            "failed to load catalog from {}",
            config.store.catalog.display()
        )
    })?;

    let currency = parse_currency(&config.store.currency)?;

    let store = FileStore::open(&config.store.store_dir).with_context(|| {
        format!(
            "failed to open cart store in {}",
            config.store.store_dir.display()
        )
    })?;

    debug!(dir = %store.dir().display(), "using file store");

    let mut cart = Cart::open(store);
    let session = StaticSession::from(config.store.patient.map(PatientId::new));

    let mut ctx = CommandContext {
        catalog: &catalog,
        cart: &mut cart,
        session: &session,
        currency,
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    run(&config.command, &mut ctx, &mut handle)?;

    Ok(())
}
