//! Account registration and login.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use secrecy::SecretString;

use levelup_client::UserDraft;
use levelup_core::Email;

use super::{Context, full_name, print_user};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and log in
    Register(RegisterArgs),
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: Email,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Log out (the cart is kept)
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Account email
    #[arg(short, long)]
    email: Email,

    /// Account password
    #[arg(short, long)]
    password: String,

    /// Given name(s)
    #[arg(long)]
    first_name: String,

    /// Family name(s)
    #[arg(long)]
    last_name: String,

    /// Chilean national ID (RUN)
    #[arg(long)]
    run: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    birth_date: Option<NaiveDate>,

    /// Region of residence
    #[arg(long)]
    region: Option<String>,

    /// Commune of residence
    #[arg(long)]
    comuna: Option<String>,

    /// Referral code of the friend who invited you
    #[arg(long)]
    referral_code: Option<String>,
}

pub async fn run(ctx: &mut Context, action: AuthAction) -> levelup_client::Result<()> {
    match action {
        AuthAction::Register(args) => {
            let password = SecretString::from(args.password);
            let mut draft = UserDraft::new(
                args.email.clone(),
                args.first_name,
                args.last_name,
                password.clone(),
            );
            draft.run = args.run;
            draft.birth_date = args.birth_date;
            draft.region = args.region;
            draft.comuna = args.comuna;
            draft.referred_by = args.referral_code;

            let user = ctx.api.register(&draft).await?;
            println!("Account created for {}", user.email);
            login(ctx, &args.email, &password).await?;
        }
        AuthAction::Login { email, password } => {
            login(ctx, &email, &SecretString::from(password)).await?;
        }
        AuthAction::Logout => {
            ctx.store.logout();
            println!("Logged out");
        }
        AuthAction::Whoami => match ctx.store.session().user() {
            Some(user) => print_user(user),
            None if ctx.store.is_authenticated() => println!("Logged in (no profile cached)"),
            None => println!("Not logged in"),
        },
    }
    Ok(())
}

async fn login(
    ctx: &mut Context,
    email: &Email,
    password: &SecretString,
) -> levelup_client::Result<()> {
    let payload = ctx.api.login(email, password).await?;
    ctx.store.login(payload)?;
    if let Some(user) = ctx.store.session().user() {
        println!("Welcome, {}! You have {} points.", full_name(user), user.points);
    }
    Ok(())
}
