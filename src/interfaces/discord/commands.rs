//! Slash-command definitions and option parsing.

use serenity::all::{
    CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption, ResolvedValue,
};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::bridge::{ApproveCommand, DraftCommand};
use crate::core::workflow::{AttachmentRef, DraftOptions, Platform};

pub const POST_COMMAND: &str = "post";
pub const APPROVE_COMMAND: &str = "approvato";

pub fn definitions() -> Vec<CreateCommand> {
    vec![post_definition(), approve_definition()]
}

fn text_option(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, name, description)
}

fn post_definition() -> CreateCommand {
    CreateCommand::new(POST_COMMAND)
        .description("Genera una bozza di post social tramite n8n")
        .add_option(
            text_option("descrizione", "Descrizione del prodotto o del contenuto").required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::Attachment, "immagine", "Immagine del post")
                .required(true),
        )
        .add_option(text_option("descrizione_post", "Indicazioni extra per il testo del post"))
        .add_option(
            text_option("lingua", "Lingua del post")
                .add_string_choice("Italiano", "it")
                .add_string_choice("English", "en"),
        )
        .add_option(
            text_option("target", "Pubblico di destinazione")
                .add_string_choice("B2B", "b2b")
                .add_string_choice("B2C", "b2c"),
        )
        .add_option(text_option("brand", "Brand (default dalla configurazione)"))
        .add_option(text_option("link", "Link da includere nel post"))
}

fn approve_definition() -> CreateCommand {
    let mut platform = text_option("piattaforma", "Dove pubblicare").required(true);
    for p in Platform::TARGETS {
        platform = platform.add_string_choice(p.label(), p.as_str());
    }
    platform = platform.add_string_choice(Platform::All.label(), Platform::All.as_str());

    CreateCommand::new(APPROVE_COMMAND)
        .description("Approva la bozza e pubblica")
        .add_option(platform)
        .add_option(
            text_option("conferma", "Confermi la pubblicazione?")
                .required(true)
                .add_string_choice("si", "si")
                .add_string_choice("no", "no"),
        )
        .add_option(text_option("token", "Token della bozza (non serve dentro il thread)"))
}

#[derive(Debug, Clone)]
pub enum OptionArg {
    Text(String),
    Attachment(AttachmentRef),
}

/// Option values keyed by name, detached from the gateway payload.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs(HashMap<String, OptionArg>);

impl CommandArgs {
    pub fn from_resolved(options: Vec<ResolvedOption<'_>>) -> Self {
        let mut args = Self::default();
        for option in options {
            match option.value {
                ResolvedValue::String(s) => args.insert_text(option.name, s),
                ResolvedValue::Attachment(a) => args.insert(
                    option.name,
                    OptionArg::Attachment(AttachmentRef {
                        url: a.url.clone(),
                        proxy_url: Some(a.proxy_url.clone()),
                        filename: Some(a.filename.clone()),
                        content_type: a.content_type.clone(),
                    }),
                ),
                _ => {}
            }
        }
        args
    }

    pub fn insert(&mut self, name: &str, value: OptionArg) {
        self.0.insert(name.to_string(), value);
    }

    pub fn insert_text(&mut self, name: &str, value: &str) {
        self.insert(name, OptionArg::Text(value.to_string()));
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.0.get(name) {
            Some(OptionArg::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn attachment(&self, name: &str) -> Option<AttachmentRef> {
        match self.0.get(name) {
            Some(OptionArg::Attachment(a)) => Some(a.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("comando sconosciuto /{0}")]
    Unknown(String),
    #[error("opzione obbligatoria mancante: {0}")]
    Missing(&'static str),
    #[error("valore non valido per {option}: {value}")]
    Invalid { option: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Draft(DraftCommand),
    Approve(ApproveCommand),
}

pub fn parse(name: &str, args: &CommandArgs) -> Result<ParsedCommand, CommandError> {
    match name {
        POST_COMMAND => parse_post(args).map(ParsedCommand::Draft),
        APPROVE_COMMAND => parse_approve(args).map(ParsedCommand::Approve),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_post(args: &CommandArgs) -> Result<DraftCommand, CommandError> {
    let description = args
        .text("descrizione")
        .filter(|d| !d.trim().is_empty())
        .ok_or(CommandError::Missing("descrizione"))?;
    let attachment = args
        .attachment("immagine")
        .ok_or(CommandError::Missing("immagine"))?;

    Ok(DraftCommand {
        options: DraftOptions {
            description,
            post_description: args.text("descrizione_post"),
            language: args.text("lingua"),
            target: args.text("target"),
            link: args.text("link"),
            brand: args.text("brand"),
        },
        attachment,
    })
}

fn parse_confirmation(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "si" | "sì" | "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

fn parse_approve(args: &CommandArgs) -> Result<ApproveCommand, CommandError> {
    let raw_platform = args
        .text("piattaforma")
        .ok_or(CommandError::Missing("piattaforma"))?;
    let platform = raw_platform
        .parse::<Platform>()
        .map_err(|_| CommandError::Invalid {
            option: "piattaforma",
            value: raw_platform.clone(),
        })?;

    let raw_confirm = args.text("conferma").ok_or(CommandError::Missing("conferma"))?;
    let confirmed = parse_confirmation(&raw_confirm).ok_or(CommandError::Invalid {
        option: "conferma",
        value: raw_confirm.clone(),
    })?;

    Ok(ApproveCommand {
        platform,
        confirmed,
        token: args.text("token").filter(|t| !t.trim().is_empty()),
    })
}
