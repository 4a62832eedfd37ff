// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed texts of the intake dialogue protocol.
//!
//! The assistant is instructed to reply in Spanish, so every fixed turn,
//! note, and marker phrase is Spanish too.

/// Hidden turn that makes the assistant greet the user when an incident is re-opened.
pub const REOPEN_TRIGGER: &str = "Hola, ¿qué deseas añadir o modificar?";

/// Hidden turn sent on confirmation.
pub const CONFIRMATION_TURN: &str = "Sí, el resumen es correcto. Gracias.";

/// Appended in place of the assistant's acknowledgement when it is empty or fails.
pub const ACKNOWLEDGEMENT: &str = "Gracias por confirmar. La información ha sido registrada.";

/// Visible user turn sent when the user asks to revise a presented summary.
pub const REVISION_REQUEST: &str = "Quisiera revisar o añadir algo más al resumen.";

/// Turn text for a send that carries attachments only.
pub const ATTACHMENT_ONLY_TEXT: &str = "(Archivo adjunto)";

/// System note for a failed assistant exchange.
pub const COMMUNICATION_FAILURE_NOTE: &str =
    "Error al comunicarse con el asistente IA. Por favor, verifica tu conexión o inténtalo más tarde.";

/// System note for a failed summary request.
pub const SUMMARY_FAILURE_NOTE: &str = "Error al generar resumen.";

/// System note when no assistant session can be opened.
pub const UNAVAILABLE_NOTE: &str = "Asistente IA no disponible.";

/// System note prefix for a failed save.
pub const SAVE_FAILURE_NOTE: &str = "Ocurrió un error al guardar la incidencia. Por favor, inténtalo de nuevo.";

/// Lower-case phrases whose presence in a reply means a summary is being presented.
const SUMMARY_MARKERS: &[&str] = &["he preparado el siguiente resumen", "resumen del problema"];

/// Whether an assistant reply presents a summary for review.
pub fn is_summary_presentation(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    SUMMARY_MARKERS.iter().any(|marker| lower.contains(marker))
}

const CONVERSATION_RULES: &str = "REGLAS ESTRICTAS E IMPORTANTES:
*   UNA SOLA PREGUNTA POR TURNO. No agrupes preguntas bajo ninguna circunstancia.
*   PREGUNTAS CORTAS Y SENCILLAS, en lenguaje claro y no técnico.
*   NO DES SOLUCIONES: tu objetivo es documentar el problema, no resolverlo.
*   Si el usuario adjunta un archivo, di simplemente \"Gracias, he recibido el archivo [nombre_archivo]\". No analices su contenido.
*   TONO PROFESIONAL Y SERVICIAL.
*   RESPONDE SIEMPRE EN ESPAÑOL.";

/// System instruction for a new report.
pub fn new_report_instruction(description: &str, reporter_name: &str) -> String {
    format!(
        "Eres AIRGI, un asistente IA amigable y eficiente para el reporte de incidencias. Tu misión es ayudar a un empleado a describir un problema técnico de forma clara y estructurada.
El empleado que reporta se llama \"{reporter_name}\".
El empleado ha reportado inicialmente: \"{description}\".
No necesitas preguntar el nombre del reportador, ya lo conoces.

TU COMPORTAMIENTO EN LA CONVERSACIÓN:
1.  Saluda al empleado por su nombre, confirma que has recibido la descripción inicial y haz UNA (y solo una) pregunta clara para entender mejor la situación.
2.  En cada turno siguiente formula UNA ÚNICA PREGUNTA sobre alguno de estos aspectos: qué intentaba hacer, qué esperaba, qué sucedió realmente (con los mensajes de error textuales), pasos para reproducirlo, frecuencia, impacto, soluciones ya intentadas, parte del sistema afectada, fecha y hora aproximada. Si es relevante, pregunta si puede adjuntar una captura de pantalla o vídeo.
3.  Cuando tengas suficiente información, indica al usuario que puede pedir el resumen. NO generes el resumen por tu cuenta.
4.  Cuando se te pida el resumen, genera un resumen estructurado con los campos solicitados y pregunta si es correcto antes de crear el ticket de incidencia.
5.  Si el usuario confirma, agradece y finaliza. Si quiere modificar algo, pide los detalles.

{CONVERSATION_RULES}"
    )
}

/// System instruction for re-opening an existing incident.
pub fn reopen_instruction(
    title: &str,
    reporter_name: &str,
    previous_summary: Option<&str>,
) -> String {
    let previous = previous_summary
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("El resumen anterior que se tenía es:\n{s}\n"))
        .unwrap_or_default();
    format!(
        "Eres AIRGI. Estamos retomando una conversación sobre una incidencia previamente reportada titulada: \"{title}\".
El empleado que está interactuando se llama \"{reporter_name}\".
{previous}El usuario desea añadir más información o modificar detalles.

TU COMPORTAMIENTO:
1.  Saluda a \"{reporter_name}\" y menciona que estáis continuando con el reporte \"{title}\".
2.  Pregunta qué información nueva desea añadir o qué parte del reporte le gustaría modificar, como UNA ÚNICA pregunta.
3.  A partir de ahí sigue las mismas reglas que para un reporte nuevo.
4.  Cuando se te pida el resumen, genera un NUEVO resumen COMPLETO que incorpore toda la información, la original y la nueva.

{CONVERSATION_RULES}"
    )
}

/// Hidden turn asking for the final structured summary.
///
/// The labels match [`crate::extraction::FieldKey::labels`].
pub fn summary_request(editing: bool) -> String {
    let closing = if editing {
        "antes de actualizar el ticket?"
    } else {
        "antes de crear el ticket de incidencia?"
    };
    format!(
        "Por favor, basándote en TODA nuestra conversación anterior (incluyendo cualquier información de un reporte previo si estamos editando), genera un resumen estructurado del problema con los siguientes campos:
- TituloSugerido: (Un título breve y descriptivo)
- PasosParaReproducir: (Lista numerada de los pasos)
- ComportamientoEsperado: (Lo que debería haber ocurrido)
- ComportamientoActual: (Lo que ocurrió, incluyendo mensajes de error textuales si se proporcionaron)
- ImpactoDelProblema: (Cómo afecta al usuario o al trabajo)
- EntornoPotencial: (Si se mencionó: navegador, sistema operativo, módulo)
- CategoriaSugerida: (Ej: UI, Funcionalidad, Rendimiento, Datos, Otro)
- PrioridadSugerida: (Baja, Media, Alta)

(No incluyas \"NombreDelReportador\" a menos que el usuario haya pedido cambiarlo; el sistema ya conoce al reportador.)

Luego, presenta este resumen al usuario y pregúntale: \"He preparado el siguiente resumen del problema. Por favor, revísalo. ¿Es correcto o deseas añadir o modificar algo {closing}\"
NO uses markdown para el resumen, solo texto plano con saltos de línea."
    )
}
