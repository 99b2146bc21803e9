use crate::commands;
use crate::server;
use clap::{Args, Parser, Subcommand};
use govschemes::error::AppError;
use govschemes::workflows::schemes::{Answer, Gender, Income};

#[derive(Parser, Debug)]
#[command(
    name = "Government Scheme Finder",
    about = "Match citizens to government welfare schemes from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Search, list, and add catalog schemes
    Schemes {
        #[command(subcommand)]
        command: SchemesCommand,
    },
    /// Manage stored profile preferences
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SchemesCommand {
    /// Find schemes the applicant qualifies for
    Find(FindArgs),
    /// Print every scheme in the catalog
    List,
    /// Append a scheme to the catalog and notify stored profiles
    Add(AddSchemeArgs),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Create or replace a profile
    Set(ProfileSetArgs),
    /// Show one stored profile
    Show {
        /// Profile identity (username)
        identity: String,
    },
    /// Print every stored profile
    List,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct FindArgs {
    /// Apply this user's stored preferences before filtering
    #[arg(long)]
    pub(crate) user: Option<String>,
    /// male, female, other, or any
    #[arg(long, default_value = "any")]
    pub(crate) gender: Gender,
    #[arg(long)]
    pub(crate) age: u32,
    /// State of residence
    #[arg(long, default_value = "")]
    pub(crate) state: String,
    /// Annual income
    #[arg(long, default_value = "0")]
    pub(crate) income: Income,
    /// yes, no, or any
    #[arg(long, default_value = "any")]
    pub(crate) student: Answer,
    /// yes, no, or any
    #[arg(long, default_value = "any")]
    pub(crate) married: Answer,
    /// Print a per-criterion breakdown for every catalog scheme
    #[arg(long)]
    pub(crate) explain: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AddSchemeArgs {
    #[arg(long)]
    pub(crate) name: String,
    /// State name, or `central` for nationwide schemes
    #[arg(long)]
    pub(crate) state: String,
    #[arg(long, default_value = "any")]
    pub(crate) gender: Gender,
    #[arg(long)]
    pub(crate) start_age: u32,
    #[arg(long)]
    pub(crate) end_age: u32,
    /// Income ceiling; 0 means no ceiling
    #[arg(long, default_value = "0")]
    pub(crate) income: Income,
    #[arg(long, default_value = "any")]
    pub(crate) student: Answer,
    #[arg(long, default_value = "any")]
    pub(crate) married: Answer,
}

#[derive(Args, Debug)]
pub(crate) struct ProfileSetArgs {
    /// Profile identity (username)
    pub(crate) identity: String,
    #[arg(long, default_value = "")]
    pub(crate) email: String,
    #[arg(long, default_value = "any")]
    pub(crate) gender: Gender,
    /// Preferred state; omit or pass `any` to defer to each search
    #[arg(long)]
    pub(crate) state: Option<String>,
    #[arg(long, default_value = "any")]
    pub(crate) student: Answer,
    #[arg(long, default_value = "any")]
    pub(crate) married: Answer,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Schemes { command } => {
            let config = commands::prepare()?;
            match command {
                SchemesCommand::Find(args) => commands::find_schemes(&config, args),
                SchemesCommand::List => commands::list_schemes(&config),
                SchemesCommand::Add(args) => commands::add_scheme(&config, args),
            }
        }
        Command::Profile { command } => {
            let config = commands::prepare()?;
            match command {
                ProfileCommand::Set(args) => commands::set_profile(&config, args),
                ProfileCommand::Show { identity } => commands::show_profile(&config, &identity),
                ProfileCommand::List => commands::list_profiles(&config),
            }
        }
    }
}
