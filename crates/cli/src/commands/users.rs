//! User administration and point adjustments.

use clap::{Args, Subcommand};
use secrecy::SecretString;

use levelup_client::{ApiError, Error, UserDraft};
use levelup_core::{AuthPayload, Email, Role, UserRecord};

use super::{Context, full_name, print_user};

#[derive(Subcommand)]
pub enum UsersAction {
    /// List all users
    List,
    /// Create a user
    Create {
        /// Account email
        #[arg(short, long)]
        email: Email,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Given name(s)
        #[arg(long)]
        first_name: String,

        /// Family name(s)
        #[arg(long)]
        last_name: String,

        /// Account role (user, admin)
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
    /// Change fields of an existing user
    Update(UpdateArgs),
    /// Delete a user
    Delete {
        /// Account email
        email: Email,
    },
    /// Add (or, with a negative value, spend) points for the logged-in user
    Points {
        /// Points to add
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Account email
    email: Email,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    role: Option<Role>,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    comuna: Option<String>,

    #[arg(long)]
    points: Option<u32>,

    #[arg(long)]
    level: Option<u32>,

    /// New password
    #[arg(long)]
    password: Option<String>,
}

impl UpdateArgs {
    fn apply(self, draft: &mut UserDraft) {
        if let Some(first_name) = self.first_name {
            draft.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            draft.last_name = last_name;
        }
        if let Some(role) = self.role {
            draft.role = role;
        }
        if self.region.is_some() {
            draft.region = self.region;
        }
        if self.comuna.is_some() {
            draft.comuna = self.comuna;
        }
        if self.points.is_some() {
            draft.points = self.points;
        }
        if self.level.is_some() {
            draft.level = self.level;
        }
        draft.password = self.password.map(SecretString::from);
    }
}

pub async fn run(ctx: &mut Context, action: UsersAction) -> levelup_client::Result<()> {
    match action {
        UsersAction::List => {
            let users = ctx.api().list_users().await?;
            for user in &users {
                println!(
                    "{:<32} {:<30} {:<6} lvl {:>2} {:>6} pts",
                    user.email.as_str(),
                    full_name(user),
                    user.role.to_string(),
                    user.level,
                    user.points
                );
            }
            println!("{} user(s)", users.len());
        }
        UsersAction::Create {
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            let mut draft =
                UserDraft::new(email, first_name, last_name, SecretString::from(password));
            draft.role = role;
            let user = ctx.api().create_user(&draft).await?;
            print_user(&user);
        }
        UsersAction::Update(args) => {
            let api = ctx.api();
            let email = args.email.clone();
            let users = api.list_users().await?;
            let existing = find_user(&users, &email)?;
            let mut draft = UserDraft::from_record(existing);
            args.apply(&mut draft);

            let updated = api.update_user(&email, &draft).await?;
            refresh_own_profile(ctx, updated.clone())?;
            print_user(&updated);
        }
        UsersAction::Delete { email } => {
            ctx.api().delete_user(&email).await?;
            println!("Deleted {email}");
        }
        UsersAction::Points { delta } => {
            let token = ctx.token()?;
            let updated = ctx.api.with_token(token.as_str()).adjust_points(delta).await?;
            ctx.store.login(AuthPayload::new(token, updated))?;
            if let Some(user) = ctx.store.session().user() {
                println!("Balance: {} points", user.points);
            }
        }
    }
    Ok(())
}

fn find_user<'a>(users: &'a [UserRecord], email: &Email) -> levelup_client::Result<&'a UserRecord> {
    users
        .iter()
        .find(|user| user.email == *email)
        .ok_or_else(|| Error::Api(ApiError::NotFound(format!("user {email}"))))
}

/// Keep the cached session profile current when admins edit themselves.
fn refresh_own_profile(ctx: &mut Context, updated: UserRecord) -> levelup_client::Result<()> {
    let is_self = ctx
        .store
        .session()
        .user()
        .is_some_and(|user| user.email == updated.email);
    if is_self {
        let token = ctx.token()?;
        ctx.store.login(AuthPayload::new(token, updated))?;
    }
    Ok(())
}
