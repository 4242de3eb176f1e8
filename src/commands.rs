//! Command dispatch

use std::io;

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::info;

use pathlab_cart::{
    cart::Cart,
    catalog::Catalog,
    checkout::{CheckoutError, prepare_checkout},
    session::SessionGate,
    storage::KeyValueStore,
    summary::{CartSummary, SummaryError},
};

use crate::config::Command;

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub(crate) enum CommandError {
    /// No test with this id in the catalog.
    #[error("Unknown test: {0}")]
    UnknownTest(String),

    /// No package with this id in the catalog.
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// Package exists but is not on sale.
    #[error("Package {0} is not currently offered")]
    InactivePackage(String),

    /// Checkout could not be prepared.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Summary could not be rendered.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Checkout request could not be encoded.
    #[error("failed to encode checkout request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Everything a command needs besides its arguments.
#[derive(Debug)]
pub(crate) struct CommandContext<'a, S: KeyValueStore, G: SessionGate> {
    pub catalog: &'a Catalog,
    pub cart: &'a mut Cart<S>,
    pub session: &'a G,
    pub currency: &'static Currency,
}

/// Run one command, writing its output to `out`.
pub(crate) fn run<S, G>(
    command: &Command,
    ctx: &mut CommandContext<'_, S, G>,
    out: &mut impl io::Write,
) -> Result<(), CommandError>
where
    S: KeyValueStore,
    G: SessionGate,
{
    match command {
        Command::AddTest { id } => {
            let test = ctx
                .catalog
                .test(id)
                .ok_or_else(|| CommandError::UnknownTest(id.clone()))?;

            if ctx.cart.add_test(test) {
                info!(id, "test added");
                writeln!(out, "Added {}", test.name)?;
            } else {
                writeln!(out, "{} is already in the cart", test.name)?;
            }
        }
        Command::AddPackage { id } => {
            let package = ctx
                .catalog
                .package(id)
                .ok_or_else(|| CommandError::UnknownPackage(id.clone()))?;

            if !package.is_active {
                return Err(CommandError::InactivePackage(id.clone()));
            }

            if ctx.cart.add_package(package) {
                info!(id, "package added");
                writeln!(out, "Added {}", package.name)?;
            } else {
                writeln!(out, "{} is already in the cart", package.name)?;
            }
        }
        Command::Remove { id } => {
            if ctx.cart.remove_item(id) {
                writeln!(out, "Removed {id}")?;
            } else {
                writeln!(out, "{id} is not in the cart")?;
            }
        }
        Command::Clear => {
            ctx.cart.clear();
            writeln!(out, "Cart cleared")?;
        }
        Command::Show => {
            CartSummary::new(ctx.cart, ctx.currency).write_to(&mut *out)?;
        }
        Command::TestIds => {
            let mut ids: Vec<String> = ctx.cart.all_test_ids().into_iter().collect();
            ids.sort_unstable();

            for id in ids {
                writeln!(out, "{id}")?;
            }
        }
        Command::Checkout => {
            let request = prepare_checkout(ctx.cart, ctx.session)?;

            info!(patient = %request.patient_id, tests = request.test_ids.len(), "checkout prepared");

            serde_json::to_writer_pretty(&mut *out, &request)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
