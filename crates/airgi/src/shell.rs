// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `airgi report` and `airgi edit`: the interactive intake session.
//!
//! Plain lines are sent as user turns; lines starting with `/` are
//! session commands. Ctrl+C while waiting for the assistant cancels the
//! session.

use std::path::Path;

use airgi_agent::{
    ConversationController, IntakeState, OfferedFile, SpeechInput, TurnOutcome,
};
use airgi_core::{AirgiError, AttachmentId, ChatTurn, IncidentId, Sender, UserId};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::app::App;

/// What the session starts from.
#[derive(Debug, Clone)]
pub enum IntakeMode {
    /// A new report, optionally with the description already given.
    New(Option<String>),
    /// Continue an existing incident.
    Edit(IncidentId),
}

const HELP: &str = "\
  <texto>          enviar un mensaje al asistente
  /summary         pedir el resumen estructurado
  /confirm         confirmar el resumen y guardar
  /revise          seguir conversando antes de guardar
  /attach <ruta>   adjuntar un archivo al próximo mensaje
  /remove <id>     quitar un adjunto pendiente
  /files           listar adjuntos pendientes
  /assign <id>     asignar a un usuario (o `none`)
  /voice           dictar por voz
  /share           mostrar el mensaje para compartir
  /quit            salir";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Summary,
    Confirm,
    Revise,
    Attach(&'a str),
    Remove(&'a str),
    Files,
    Assign(Option<&'a str>),
    Voice,
    Share,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("summary" | "resumen", _) => Input::Summary,
        ("confirm", _) => Input::Confirm,
        ("revise", _) => Input::Revise,
        ("attach", path) if !path.is_empty() => Input::Attach(path),
        ("remove", id) if !id.is_empty() => Input::Remove(id),
        ("files", _) => Input::Files,
        ("assign", "none" | "-") => Input::Assign(None),
        ("assign", user) if !user.is_empty() => Input::Assign(Some(user)),
        ("voice", _) => Input::Voice,
        ("share", _) => Input::Share,
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        _ => Input::Unknown(line),
    }
}

/// Mime type from the file extension. Unknown extensions fall through to
/// a type the attachment policy rejects.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Runs one intake session to completion or until the user leaves.
pub async fn run_intake(app: &App, mode: IntakeMode) -> Result<(), AirgiError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| AirgiError::Internal(format!("failed to initialize readline: {e}")))?;

    let mut controller = match mode {
        IntakeMode::New(description) => {
            let description = match description.filter(|d| !d.trim().is_empty()) {
                Some(d) => d,
                None => match read_description(&mut rl)? {
                    Some(d) => d,
                    None => return Ok(()),
                },
            };
            ConversationController::start_new(&app.context, app.identity.clone(), &description)
        }
        IntakeMode::Edit(id) => {
            let incident = app.desk().open_for_edit(&app.identity, &id).await?;
            println!(
                "{} {}",
                "Editando:".bold(),
                incident.title.as_str().cyan()
            );
            ConversationController::reopen(&app.context, app.identity.clone(), &incident)
        }
    };

    println!("{}", "AIRGI: asistente de reporte de incidencias".bold().green());
    println!("Escribe {} para ver los comandos.\n", "/help".yellow());

    // Replayed history of an edited incident is shown once up front.
    let mut shown = 0;
    if controller.draft().is_edit() {
        shown = print_turns(controller.transcript(), 0, true);
    }

    let cancel = controller.cancellation_token();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    loop {
        let initialized = controller.initialize().await;
        shown = print_turns(controller.transcript(), shown, false);
        let Err(e) = initialized else { break };
        if controller.state() != IntakeState::Initializing
            || cancel.is_cancelled()
            || !ask_retry(&mut rl)?
        {
            interrupt.abort();
            return Err(e);
        }
    }

    let mut speech = SpeechInput::unavailable();
    let prompt = format!("{}> ", "tú".green());
    loop {
        if cancel.is_cancelled() {
            println!("{}", "Sesión cancelada. El borrador no se ha guardado.".yellow());
            break;
        }
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        let input = parse_input(&line);
        debug!(state = %controller.state(), ?input, "shell input");
        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(cmd) => {
                eprintln!("{} {cmd}. Usa /help.", "Comando desconocido:".red());
            }
            Input::Files => print_pending(&mut controller),
            Input::Attach(path) => attach(&mut controller, Path::new(path)).await,
            Input::Remove(id) => {
                if controller.attachments_mut().remove(&AttachmentId(id.to_string())) {
                    println!("{}", format!("Adjunto {id} quitado.").dimmed());
                } else {
                    eprintln!("{} {id}", "No hay ningún adjunto pendiente con id".red());
                }
            }
            Input::Assign(user) => {
                match controller.assign(user.map(|u| UserId(u.to_string()))) {
                    Ok(()) => println!(
                        "{}",
                        format!("Asignado a: {}", user.unwrap_or("nadie")).dimmed()
                    ),
                    Err(e) => report_error(&e),
                }
            }
            Input::Voice => {
                let composer = controller.composer_mut();
                if !speech.start(composer) {
                    if let Some(message) = composer.error() {
                        eprintln!("{}", message.yellow());
                    }
                    composer.clear_error();
                }
            }
            Input::Share => match controller.saved() {
                Some(incident) => match app.desk().share_message(incident).await {
                    Ok(message) => println!("\n{message}\n"),
                    Err(e) => report_error(&e),
                },
                None => eprintln!("{}", "Guarda la incidencia antes de compartirla.".yellow()),
            },
            Input::Message(text) => {
                let result = controller.send_text(text).await;
                shown = after_turn(&controller, shown, result);
            }
            Input::Summary => {
                let result = controller.request_summary().await;
                shown = after_turn(&controller, shown, result);
            }
            Input::Revise => {
                let result = controller.request_revision().await;
                shown = after_turn(&controller, shown, result);
            }
            Input::Confirm => {
                let result = controller.confirm().await;
                shown = print_turns(controller.transcript(), shown, false);
                match result {
                    Ok(incident) => {
                        println!(
                            "{} {}",
                            "Incidencia guardada:".bold().green(),
                            incident.id.to_string().cyan()
                        );
                        println!(
                            "Usa {} para el mensaje de equipo o {} para salir.",
                            "/share".yellow(),
                            "/quit".yellow()
                        );
                    }
                    Err(e) => report_error(&e),
                }
            }
        }
    }

    interrupt.abort();
    if controller.state() != IntakeState::Saved {
        warn!(draft = %controller.draft().draft_key, "intake left without saving");
    }
    println!("{}", "adiós".dimmed());
    Ok(())
}

fn ask_retry(rl: &mut DefaultEditor) -> Result<bool, AirgiError> {
    match rl.readline("¿Reintentar la conexión? (s/n) ") {
        Ok(line) => Ok(matches!(line.trim().to_lowercase().as_str(), "s" | "si" | "sí")),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(AirgiError::Internal(format!("readline failed: {e}"))),
    }
}

fn read_description(rl: &mut DefaultEditor) -> Result<Option<String>, AirgiError> {
    println!("{}", "Describe brevemente el problema:".bold());
    loop {
        match rl.readline("> ") {
            Ok(line) if !line.trim().is_empty() => return Ok(Some(line.trim().to_string())),
            Ok(_) => continue,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(None),
            Err(e) => return Err(AirgiError::Internal(format!("readline failed: {e}"))),
        }
    }
}

/// Prints what an exchange appended and, for a presented summary, the
/// record that would be saved.
fn after_turn(
    controller: &ConversationController,
    shown: usize,
    result: Result<TurnOutcome, AirgiError>,
) -> usize {
    let shown = print_turns(controller.transcript(), shown, false);
    match result {
        Ok(TurnOutcome::SummaryPresented) => {
            if let Some(record) = controller.record() {
                println!("{}", "Registro que se guardará:".dimmed());
                println!("{}", record.render().dimmed());
            }
            println!(
                "¿Es correcto? {} para guardar, {} para seguir.",
                "/confirm".yellow(),
                "/revise".yellow()
            );
        }
        Ok(_) => {}
        Err(e) => report_error(&e),
    }
    shown
}

/// Prints turns from `from` on and returns the new high-water mark.
fn print_turns(turns: &[ChatTurn], from: usize, include_user: bool) -> usize {
    for turn in turns.iter().skip(from) {
        match turn.sender {
            Sender::Assistant => println!("{} {}\n", "AIRGI>".bold().cyan(), turn.text),
            Sender::System => println!("{}\n", turn.text.as_str().yellow()),
            Sender::User if include_user => println!("{} {}\n", "tú>".green(), turn.text),
            Sender::User => {}
        }
        for attachment in &turn.attachments {
            println!("  {} {}", "adjunto:".dimmed(), attachment.name.as_str().dimmed());
        }
    }
    turns.len()
}

fn print_pending(controller: &mut ConversationController) {
    let attachments = controller.attachments_mut();
    attachments.apply_ready_previews();
    let pending = attachments.pending();
    if pending.is_empty() {
        println!("{}", "No hay adjuntos pendientes.".dimmed());
        return;
    }
    for a in pending {
        let preview = if a.preview.is_some() {
            "  vista previa lista".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {}  {} ({}, {} bytes){preview}", a.id, a.name, a.mime_type, a.size);
    }
}

async fn attach(controller: &mut ConversationController, path: &Path) {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{} {}: {e}", "No se pudo leer".red(), path.display());
            return;
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let file = OfferedFile::new(name, mime_for(path), content);
    match controller.attachments_mut().offer(vec![file]) {
        Ok(ids) => {
            for id in ids {
                println!("{}", format!("Adjunto pendiente: {id}").dimmed());
            }
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &AirgiError) {
    eprintln!("{}: {e}", "error".red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_messages_are_told_apart() {
        assert_eq!(parse_input("  hola  "), Input::Message("hola"));
        assert_eq!(parse_input("/summary"), Input::Summary);
        assert_eq!(parse_input("/resumen"), Input::Summary);
        assert_eq!(parse_input("/attach  ./a b.png "), Input::Attach("./a b.png"));
        assert_eq!(parse_input("/assign none"), Input::Assign(None));
        assert_eq!(parse_input("/assign u-9"), Input::Assign(Some("u-9")));
        assert_eq!(parse_input("/attach"), Input::Unknown("/attach"));
        assert_eq!(parse_input("/exit"), Input::Quit);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("captura.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("error.log")), "text/plain");
        assert_eq!(mime_for(Path::new("setup.exe")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("sin_extension")), "application/octet-stream");
    }
}
