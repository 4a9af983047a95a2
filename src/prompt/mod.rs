//! Prompt construction for the generative backend.
//!
//! Every template the gateway sends upstream lives here, one builder per
//! concern, so handler code never assembles prompt text inline:
//! consultation framing (clinician support vs. patient-facing tone),
//! history-aware dialogue turns, short clinical notes, the end-of-session
//! conclusion, file analysis, clinical image reading, and spoken replies
//! kept free of markup.
//!
//! All templates are Spanish; the service fronts Spanish-speaking demo
//! clients.

use thiserror::Error;

use crate::session::{render_context, Turn};

/// Tiny probe sent to verify upstream connectivity.
pub const CONNECTIVITY_PROBE: &str = "Di hola";

/// Framing prepended to every free-form consultation.
const CONSULTATION_SYSTEM: &str = "Eres un asistente médico virtual profesional y empático.
Tu función es proporcionar información médica general y orientación preliminar.

IMPORTANTE:
- Siempre recuerda que NO eres un doctor real y no puedes diagnosticar
- Recomienda buscar atención médica profesional para casos serios
- Sé empático y comprensivo con las preocupaciones del paciente
- Proporciona información clara y útil basada en conocimientos médicos generales
- Si detectas síntomas graves, indica que busque atención médica inmediata

Responde de manera clara, concisa y profesional.";

const IMAGE_READING: &str = "
Eres un asistente médico experto en interpretación de imágenes clínicas.
El usuario te ha enviado una imagen que puede ser un estudio médico, radiografía, herida, análisis o documento visual relacionado con salud.

Tu tarea:
1. Interpreta con detalle lo que se observa: estructuras afectadas, tejidos, posibles patologías, signos de infección o daño.
2. Describe la posible causa o diagnóstico preliminar si es evidente.
3. Si es una imagen médica (como rayos X, tomografía, resonancia, laboratorio o herida), analiza con precisión anatómica y médica.
4. Al final, formula una sola pregunta útil o de seguimiento, explícala y da alguna recomendación.

Nunca digas frases como \"No soy médico\", ni respondas de forma ambigua.
Si la imagen es clara, interpreta aunque el caso sea grave.
Habla como si fueras un profesional que ayuda a entender el resultado, no que evade responsabilidad.

SE BREVE, PERO EXPLICA TODO, AUNQUE SEAS BREVE TODO EXPLICADO E INTERPRETADO AL 100
";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("no conversation history to conclude")]
    EmptyHistory,
}

/// Consultation fields shared by the clinician and patient endpoints.
#[derive(Debug, Clone, Default)]
pub struct ConsultationInput {
    pub patient: Vec<(String, String)>,
    pub symptoms: String,
    pub studies: Vec<String>,
}

fn render_profile(fields: &[(String, String)]) -> String {
    let inner = fields
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}

fn render_studies(studies: &[String]) -> String {
    format!("[{}]", studies.join(", "))
}

/// Differential-support framing for the clinician endpoint.
pub fn clinician_note(input: &ConsultationInput) -> String {
    format!(
        "
Eres un asistente que APOYA a un MÉDICO TITULADO.
Devuelve:
1) Resumen clínico (TENLO EN CUENTA, PERO NO LO MENCIONAS A MENOS DE QUE SE TE PIDA)
2) 3-5 diagnósticos diferenciales con razonamiento corto.
3) Próximos pasos sugeridos.
4) Advertencia: el veredicto es del médico; esto NO sustituye consulta.

Paciente: {profile}
Síntomas: {symptoms}
Estudios/URLs: {studies}
Responde en español en formato claro y con viñetas.
",
        profile = render_profile(&input.patient),
        symptoms = input.symptoms,
        studies = render_studies(&input.studies),
    )
}

/// Patient-facing framing for the same consultation fields. The reply is
/// later voiced, so the rules push for short unformatted text.
pub fn patient_reply(input: &ConsultationInput) -> String {
    format!(
        "
Eres un asistente que habla con un PACIENTE. Tono empático y claro.
Incluye:
- Explicación sencilla de lo que podría estar pasando (no diagnóstico).
- Señales de alarma si aplican.
- Pasos sugeridos (p.ej. agendar cita).
- A veces el paciente se siente más cómodo hablando contigo, no lo cortes.
- PREGUNTA HASTA QUE LLEGUES A UN DIAGNOSTICO, NO ESPECULES. PERO UNA PREGUNTA A LA VEZ, ANALIZA LO QUE TE CONTESTO Y PREGUNTALE OTRA LUEGO DE SU RESPUESTA. SI YA SABES ALGO SIMPLEMENTE RESPONDELE
- TRATA DE DAR RESPUESTAS BREVES, PERO SIN DEJAR LA SENSACIÓN DE QUE FUE MUY CORTA, ESTO POR QUE TU RESPUESTA SERÁ UTILIZADA PARA GENERAR UN AUDIO Y MANDARSELO AL PACIENTE. RECUERDA, MUY MUY CORTA
- COMO TU RESPUESTA SE PASARA A AUDIO, NO PONGAS CARACTERES COMO GUIONES, ASTERISCOS, ETC...
- NO MUESTRES LA INFORMACIÓN DEL PACIENTE A MENOS QUE SE TE PIDA.

Paciente: {profile}
Síntomas: {symptoms}
Estudios/URLs: {studies}
",
        profile = render_profile(&input.patient),
        symptoms = input.symptoms,
        studies = render_studies(&input.studies),
    )
}

/// History-aware patient turn for the key-value interaction endpoint.
pub fn dialogue(context: &str, message: &str) -> String {
    format!(
        "
Eres un asistente médico que habla con un PACIENTE.
Sé empático y claro, pero profesional. Usa el historial para dar continuidad.

Historial:
{context}

Paciente: {message}
"
    )
}

/// Same turn framed over the server-recorded history, used by the document
/// family.
pub fn dialogue_continued(context: &str, message: &str) -> String {
    format!(
        "
Eres un asistente médico que habla con un PACIENTE. Sé empático y claro.
Historial previo:
{context}

Paciente: {message}
"
    )
}

/// Three-line clinical note summarizing a reply.
pub fn summary_note(text: &str) -> String {
    format!(
        "
Eres un médico que está redactando notas clínicas.
Resume lo siguiente en 3 líneas máximo, con tono médico y conciso:

Texto: {text}
"
    )
}

/// Closing summary over the whole session. Fails when there is nothing to
/// summarize so callers can reject before touching the backend.
pub fn conclusion(history: &[Turn]) -> Result<String, PromptError> {
    if history.is_empty() {
        return Err(PromptError::EmptyHistory);
    }
    let transcript = render_context(history);
    Ok(format!(
        "
Eres un médico escribiendo la CONCLUSIÓN FINAL de una consulta con un paciente.
Haz un resumen clínico en 8–10 líneas que incluya:
- Motivo de consulta
- Síntomas principales
- Evolución durante la conversación
- Posibles diagnósticos diferenciales
- Recomendaciones finales
- Advertencia de que no sustituye una consulta real

Conversación:
{transcript}
"
    ))
}

/// Document-analysis instruction attached to an uploaded file. `structured`
/// asks for a machine-readable JSON reply; otherwise the answer is prose for
/// the document family.
pub fn file_analysis(instructions: &str, structured: bool) -> String {
    let extra = if instructions.is_empty() {
        String::new()
    } else {
        format!("Instrucciones del usuario: {instructions}")
    };
    if structured {
        format!(
            "
Analiza el archivo adjunto (imagen, PDF o DOCX).
Extrae texto (OCR si aplica), estructura, tablas y datos clave.

Responde SOLO con un JSON válido (sin explicaciones).
{extra}
"
        )
    } else {
        format!(
            "
Analiza el archivo adjunto (imagen, PDF o DOCX).
Extrae texto (OCR), estructura, tablas y datos clave.
En español
{extra}
"
        )
    }
}

/// Clinical image interpretation used by the voice session when the upload
/// turns out to be an image.
pub fn image_reading() -> &'static str {
    IMAGE_READING
}

/// Spoken reply to a transcribed (or image-derived) patient utterance.
pub fn voice_reply(user_text: &str) -> String {
    format!(
        "
Eres una asistente médica virtual amable y empática.
Tu objetivo es ayudar directamente al paciente de forma clara y breve.

Reglas:
- Responde cortamente, pues tu respuesta se va a grabar y no queremos dejar esperando al usuario, sin guiones, sin listas ni formato.
- Cada intervención tuya debe ser importante aunque sea corta.
- Evita sonar como doctora formal o dar diagnósticos clínicos largos.
- No pongas advertencias ni aclaraciones tipo \"no soy médico\".
- Primero intenta ayudar y orientar
- Haz preguntas de su situación hasta encontrar un resultado y darle una conclusión, si desde el primer input que te da el usuario encuentras una conclusión, está bien
- Si crees que puede ser algo serio, sugiere ir al médico en una sola frase, al final. SOLO SI ES GRAVE.
- Sé humana, cálida y directa, no robótica.

Paciente dice (texto o imagen interpretada): \"{user_text}\"
Tu respuesta:
"
    )
}

/// Two-line note on a voiced reply.
pub fn voice_note(answer: &str) -> String {
    format!("Redacta una nota médica de 2 líneas máximo: {answer}")
}

/// Running session note, shown to the patient while the call is live.
pub fn voice_session_note(answer: &str) -> String {
    format!(
        "En pocas líneas dame algo como una nota médica, esto ayudará a ver el resumen de la llamada, no des solo un tipo summary, si no algo importante de la interacción, por ejemplo lo que pienses que pueda ser la situación, SE MUY MUY BREVE Y SOLO RESPONDE CONCISO, NADA DE INTRODUCCIONES TIPO CLARO QUE SI, AQUI ESTA TU NOTA, SE BREVE PERO IMPORTANTE, ESTAS NOTAS LAS ESTARA VIENDO EL PACIENTE EN TIEMPO REAL, ES COMO UN APOYO PARA EL, NO TE REFIERAS A EL COMO PACIENTE, SOLO DA LA NOTA: {answer}"
    )
}

/// Free-form consultation with the standing system framing.
pub fn consultation(query: &str) -> String {
    format!("{CONSULTATION_SYSTEM}\n\nConsulta del paciente: {query}")
}

/// Structured report over a consultation and the reply it got.
pub fn report(query: &str, answer: &str) -> String {
    format!(
        "Genera un reporte médico estructurado basado en la siguiente consulta y respuesta:

CONSULTA DEL PACIENTE:
{query}

RESPUESTA PROPORCIONADA:
{answer}

Genera un reporte médico que incluya:
1. Resumen de la consulta
2. Síntomas o preocupaciones principales identificadas
3. Recomendaciones dadas
4. Acciones sugeridas
5. Nivel de urgencia (Bajo/Medio/Alto)

Formato: JSON con las siguientes claves: resumen, sintomas, recomendaciones, acciones, urgencia"
    )
}
