pub mod get;
pub mod init;
pub mod ls;
pub mod put;
pub mod recover;
pub mod rm;
pub mod stat;

use mailblob_cli::{AppState, Store, StoreSetupError};

use crate::cli::op::OpContext;

crate::command_enum! {
    (Init, init::Init),
    (Put, put::Put),
    (Get, get::Get),
    (Rm, rm::Rm),
    (Ls, ls::Ls),
    (Stat, stat::Stat),
    (Recover, recover::Recover),
}

/// Load the state directory and open its store
pub(crate) async fn open_store(ctx: &OpContext) -> Result<(AppState, Store), StoreSetupError> {
    let state = AppState::load(ctx.config_path.clone())?;
    let store = mailblob_cli::open_store(&state).await?;
    Ok((state, store))
}
