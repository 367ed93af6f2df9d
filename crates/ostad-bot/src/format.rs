use ostad_types::models::{Experience, ExperienceStatus};

use crate::texts::TextStore;

/// Appended when a rendering had to be cut short.
pub const CONTINUATION: &str = "…";

/// `#Name_With_Underscores`
pub fn tag(name: &str) -> String {
    format!("#{}", name.trim().replace(' ', "_"))
}

pub fn tags(exp: &Experience) -> String {
    [
        &exp.field_name,
        &exp.major_name,
        &exp.professor_name,
        &exp.course_name,
    ]
    .iter()
    .map(|n| tag(n))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Sections of the rendering that hold submitter text.
struct Body<'a> {
    teaching: &'a str,
    notes: &'a str,
    project: &'a str,
    attendance: &'a str,
    exam: &'a str,
    conclusion: &'a str,
}

pub fn render_experience(texts: &TextStore, exp: &Experience) -> String {
    render(
        texts,
        exp,
        Body {
            teaching: &exp.teaching_style,
            notes: &exp.notes,
            project: &exp.project,
            attendance: &exp.attendance_details,
            exam: &exp.exam,
            conclusion: &exp.conclusion,
        },
    )
}

/// Same layout with every free-text section replaced by the placeholder.
pub fn render_redacted(texts: &TextStore, exp: &Experience) -> String {
    let placeholder = texts.get("redacted_placeholder");
    render(
        texts,
        exp,
        Body {
            teaching: &placeholder,
            notes: &placeholder,
            project: &placeholder,
            attendance: &placeholder,
            exam: &placeholder,
            conclusion: &placeholder,
        },
    )
}

fn render(texts: &TextStore, exp: &Experience, body: Body<'_>) -> String {
    let attendance = if exp.attendance_required {
        texts.get("exp_format_attendance_yes")
    } else {
        texts.get("exp_format_attendance_no")
    };

    format!(
        "{}: {} ({})\n\n\
         {}: {}\n\n\
         {}: {}\n\n\
         {}:\n{}\n\n\
         {}:\n{}\n\n\
         {}:\n{}\n\n\
         {}: {}\n{}\n\n\
         {}:\n{}\n\n\
         {}:\n{}\n\n\
         {}\n\
         {}: {}",
        texts.get("exp_format_field"),
        exp.field_name,
        exp.major_name,
        texts.get("exp_format_professor"),
        exp.professor_name,
        texts.get("exp_format_course"),
        exp.course_name,
        texts.get("exp_format_teaching"),
        body.teaching,
        texts.get("exp_format_notes"),
        body.notes,
        texts.get("exp_format_project"),
        body.project,
        texts.get("exp_format_attendance"),
        attendance,
        body.attendance,
        texts.get("exp_format_exam"),
        body.exam,
        texts.get("exp_format_conclusion"),
        body.conclusion,
        texts.get("exp_format_footer"),
        texts.get("exp_format_tags"),
        tags(exp),
    )
}

pub fn status_label(texts: &TextStore, status: ExperienceStatus) -> String {
    texts.get(status.text_key())
}

/// What an admin sees: id and status above the full rendering.
pub fn moderation_view(texts: &TextStore, exp: &Experience) -> String {
    let header = texts.format(
        "admin_experience_header",
        &[
            ("id", &exp.id),
            ("user_id", &exp.user_id),
            ("status", &status_label(texts, exp.status)),
        ],
    );
    format!("{header}\n\n{}", render_experience(texts, exp))
}

/// Cut `text` to at most `max` characters, ending with `CONTINUATION`
/// when anything was dropped.
pub fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(CONTINUATION.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(CONTINUATION);
    out
}
