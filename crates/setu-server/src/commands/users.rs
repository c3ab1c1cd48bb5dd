use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use setu_core::time::now_utc;
use setu_store::repo::UserNew;

#[derive(Debug, Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: Option<String>,
}

pub fn add_user(ctx: &Context<'_>, args: AddUserArgs) -> Result<()> {
    let user = ctx.store.users().create(
        now_utc(),
        UserNew {
            username: args.name,
            phone: args.phone,
        },
    )?;

    if ctx.json {
        print_json(&user)?;
    } else {
        println!("created {} {}", user.id, user.username);
    }
    Ok(())
}
