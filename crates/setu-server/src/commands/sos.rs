use crate::commands::{print_json, runtime, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::Args;
use setu_core::domain::DeliveryOutcome;
use setu_core::dto::{ContactDto, LocationDto, SosRequestDto};
use setu_server::service::trigger_sos;
use setu_server::AppState;

#[derive(Debug, Args)]
pub struct SosArgs {
    /// Requester id; a registered user id enables the fallback phone
    #[arg(long)]
    pub user: String,
    #[arg(long, value_name = "NAME=PHONE")]
    pub contact: Vec<String>,
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lng: Option<f64>,
}

pub fn sos(ctx: Context<'_>, args: SosArgs) -> Result<()> {
    let contacts = args
        .contact
        .iter()
        .map(|raw| parse_contact(raw))
        .collect::<Result<Vec<_>>>()?;
    let request = SosRequestDto {
        user_id: Some(args.user),
        contacts: Some(contacts),
        location: Some(LocationDto {
            lat: args.lat,
            lng: args.lng,
        }),
    };

    let json = ctx.json;
    let state = AppState::from_config(ctx.config, ctx.store).with_context(|| "build transport")?;
    let outcome = runtime()?.block_on(trigger_sos(&state, request))?;

    if json {
        print_json(&outcome.to_response())?;
        return Ok(());
    }

    println!("sos {} {}", outcome.record.id, outcome.record.status);
    println!("map {}", outcome.report.map_link);
    if outcome.report.is_empty() {
        println!("no recipients");
    }
    for result in &outcome.report.results {
        match &result.outcome {
            DeliveryOutcome::Sent { message_id } => println!("sent {} {}", result.to, message_id),
            DeliveryOutcome::Failed { reason } => println!("error {} {}", result.to, reason),
        }
    }
    Ok(())
}

fn parse_contact(raw: &str) -> Result<ContactDto> {
    let (name, phone) = raw
        .split_once('=')
        .ok_or_else(|| invalid_input(format!("contact must be NAME=PHONE: {raw}")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid_input(format!("contact name is empty: {raw}")));
    }
    Ok(ContactDto {
        name: Some(name.to_string()),
        phone: Some(phone.trim().to_string()),
        ..ContactDto::default()
    })
}

#[cfg(test)]
mod tests {
    use super::parse_contact;

    #[test]
    fn parses_name_and_phone() {
        let contact = parse_contact("Asha = 98765 43210").expect("contact");
        assert_eq!(contact.name.as_deref(), Some("Asha"));
        assert_eq!(contact.phone.as_deref(), Some("98765 43210"));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_contact("Asha").is_err());
        assert!(parse_contact("=9876543210").is_err());
    }
}
