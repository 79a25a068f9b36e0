//! Command implementations
//!
//! Each module backs one CLI subcommand or helper binary.

pub mod ask;
pub mod convert;
pub mod language_rag;
pub mod repl;
pub mod suggest;

pub use ask::{render_answer, run as ask_run, AskOptions};
pub use convert::run as convert_run;
pub use language_rag::{run as language_rag_run, LanguageRagArgs};
pub use repl::run as repl_run;
pub use suggest::run as suggest_run;
