use std::fmt::{Debug, Display};
use std::path::PathBuf;

/// Shared inputs for every command
#[derive(Debug, Clone)]
pub struct OpContext {
    /// State directory override (`--config-dir` / `MAILBLOB_DIR`)
    pub config_path: Option<PathBuf>,
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Display + Debug + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Build a clap `Command` enum over a list of ops, with matching `OpOutput`
/// and `OpError` enums and an `Op` impl that dispatches to the variant.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $op:ty)),* $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($op),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$op as $crate::cli::op::Op>::Output),)*
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(OpOutput::$variant(output) => write!(f, "{output}"),)*
                }
            }
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$op as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Error = OpError;
            type Output = OpOutput;

            async fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(OpOutput::$variant)
                            .map_err(OpError::$variant),
                    )*
                }
            }
        }
    };
}
