//! Inline and reply keyboards. Labels always come from the text store.

use ostad_db::Page;
use ostad_types::action::{Action, ListTarget};
use ostad_types::models::{Experience, ExperienceStatus, RegistryKind, RejectionReason, RequiredChannel};
use ostad_types::update::{Button, Keyboard};

use crate::texts::TextStore;

type Rows = Vec<Vec<Button>>;

pub fn main_menu(texts: &TextStore) -> Keyboard {
    Keyboard::Reply(vec![
        vec![texts.get("btn_submit_experience")],
        vec![texts.get("btn_my_experiences"), texts.get("btn_rules")],
        vec!["/search".to_string()],
    ])
}

/// One button per item, two per row.
pub fn choices<I>(items: I, to_action: impl Fn(i64) -> Action) -> Rows
where
    I: IntoIterator<Item = (i64, String)>,
{
    let buttons: Vec<Button> = items
        .into_iter()
        .map(|(id, name)| Button::action(name, to_action(id)))
        .collect();
    buttons.chunks(2).map(<[Button]>::to_vec).collect()
}

fn cancel_row(texts: &TextStore) -> Vec<Button> {
    vec![Button::action(texts.get("btn_cancel"), Action::CancelSubmission)]
}

// -- Submission --

pub fn selection(texts: &TextStore, mut rows: Rows) -> Keyboard {
    rows.push(cancel_row(texts));
    Keyboard::Inline(rows)
}

pub fn professors(texts: &TextStore, mut rows: Rows) -> Keyboard {
    rows.push(vec![Button::action(
        texts.get("btn_add_new_professor"),
        Action::AddNewProfessor,
    )]);
    rows.push(cancel_row(texts));
    Keyboard::Inline(rows)
}

pub fn cancel_submission(texts: &TextStore) -> Keyboard {
    Keyboard::Inline(vec![cancel_row(texts)])
}

pub fn attendance(texts: &TextStore) -> Keyboard {
    Keyboard::Inline(vec![
        vec![
            Button::action(texts.get("btn_yes"), Action::Attendance(true)),
            Button::action(texts.get("btn_no"), Action::Attendance(false)),
        ],
        cancel_row(texts),
    ])
}

// -- Moderation --

pub fn approval(texts: &TextStore, id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        Button::action(texts.get("btn_approve"), Action::Approve(id)),
        Button::action(texts.get("btn_reject"), Action::Reject(id)),
    ]])
}

pub fn approved(texts: &TextStore, id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![Button::action(
        texts.get("btn_redact"),
        Action::Redact(id),
    )]])
}

/// Controls matching the current status of an experience, if any.
pub fn moderation(texts: &TextStore, exp: &Experience) -> Option<Keyboard> {
    match exp.status {
        ExperienceStatus::Pending => Some(approval(texts, exp.id)),
        ExperienceStatus::Approved if !exp.redacted => Some(approved(texts, exp.id)),
        _ => None,
    }
}

pub fn rejection_reasons(texts: &TextStore, id: i64) -> Keyboard {
    let mut rows: Rows = RejectionReason::ALL
        .into_iter()
        .map(|reason| {
            vec![Button::action(
                texts.get(&reason.text_key()),
                Action::RejectWithReason(id, reason),
            )]
        })
        .collect();
    rows.push(vec![Button::action(texts.get("btn_back"), Action::ViewExperience(id))]);
    Keyboard::Inline(rows)
}

pub fn review_queue(texts: &TextStore, page: &Page<Experience>) -> Keyboard {
    let mut rows: Rows = page
        .items
        .iter()
        .map(|exp| {
            vec![Button::action(
                format!("#{} {} / {}", exp.id, exp.course_name, exp.professor_name),
                Action::ViewExperience(exp.id),
            )]
        })
        .collect();
    rows.extend(nav_row(texts, page, Action::ReviewQueue));
    rows.push(back_to_panel(texts));
    Keyboard::Inline(rows)
}

// -- Submitter's own experiences --

pub fn own_experiences(texts: &TextStore, exps: &[Experience]) -> Keyboard {
    Keyboard::Inline(
        exps.iter()
            .map(|exp| {
                vec![Button::action(
                    format!(
                        "{} / {} ({})",
                        exp.course_name,
                        exp.professor_name,
                        texts.get(exp.status.text_key())
                    ),
                    Action::ViewOwnExperience(exp.id),
                )]
            })
            .collect(),
    )
}

pub fn own_experience(texts: &TextStore, exp: &Experience) -> Keyboard {
    let primary = match exp.status {
        ExperienceStatus::Pending => {
            Button::action(texts.get("btn_edit_experience"), Action::EditExperience(exp.id))
        }
        ExperienceStatus::Approved | ExperienceStatus::Rejected => {
            Button::action(texts.get("btn_resubmit"), Action::Resubmit(exp.id))
        }
    };
    Keyboard::Inline(vec![
        vec![primary],
        vec![Button::action(texts.get("btn_back"), Action::MyExperiences)],
    ])
}

pub fn confirm_edit(texts: &TextStore, id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        Button::action(texts.get("btn_confirm"), Action::ConfirmEditExperience(id)),
        Button::action(texts.get("btn_back"), Action::ViewOwnExperience(id)),
    ]])
}

// -- Access --

pub fn join_channels(texts: &TextStore, channels: &[RequiredChannel]) -> Keyboard {
    let mut rows: Rows = channels
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            vec![Button::url(
                texts.format("btn_join_channel", &[("n", &(i + 1))]),
                ch.invite_link.clone(),
            )]
        })
        .collect();
    rows.push(vec![Button::action(
        texts.get("btn_check_membership"),
        Action::CheckMembership,
    )]);
    Keyboard::Inline(rows)
}

// -- Admin panel --

pub fn admin_panel(texts: &TextStore) -> Keyboard {
    let b = |key: &str, action: Action| Button::action(texts.get(key), action);
    Keyboard::Inline(vec![
        vec![
            b("btn_admin_fields", Action::List(ListTarget::Registry(RegistryKind::Field), 1)),
            b("btn_admin_majors", Action::List(ListTarget::Registry(RegistryKind::Major), 1)),
        ],
        vec![
            b("btn_admin_courses", Action::List(ListTarget::Registry(RegistryKind::Course), 1)),
            b("btn_admin_professors", Action::List(ListTarget::Registry(RegistryKind::Professor), 1)),
        ],
        vec![
            b("btn_admin_review_queue", Action::ReviewQueue(1)),
            b("btn_admin_admins", Action::List(ListTarget::Admins, 1)),
        ],
        vec![
            b("btn_admin_texts", Action::List(ListTarget::Texts, 1)),
            b("btn_admin_channels", Action::List(ListTarget::Channels, 1)),
        ],
        vec![
            b("btn_admin_stats", Action::Stats),
            b("btn_admin_broadcast", Action::Broadcast),
            b("btn_admin_direct_message", Action::DirectMessage),
        ],
    ])
}

pub fn back_to_panel(texts: &TextStore) -> Vec<Button> {
    vec![Button::action(texts.get("btn_back_to_panel"), Action::AdminPanel)]
}

pub fn cancel_admin_flow(texts: &TextStore) -> Keyboard {
    Keyboard::Inline(vec![vec![Button::action(
        texts.get("btn_cancel"),
        Action::CancelAdminFlow,
    )]])
}

/// "Previous" / "page x/y" / "Next", omitted when there is one page or less.
pub fn nav_row<T>(
    texts: &TextStore,
    page: &Page<T>,
    to_action: impl Fn(u32) -> Action,
) -> Option<Vec<Button>> {
    if page.total_pages <= 1 {
        return None;
    }
    let mut row = Vec::new();
    if page.has_prev() {
        row.push(Button::action(texts.get("btn_prev_page"), to_action(page.page - 1)));
    }
    row.push(Button::action(
        format!("{}/{}", page.page, page.total_pages),
        Action::Noop,
    ));
    if page.has_next() {
        row.push(Button::action(texts.get("btn_next_page"), to_action(page.page + 1)));
    }
    Some(row)
}

pub fn confirm_delete(texts: &TextStore, confirm: Action, back: Action) -> Keyboard {
    Keyboard::Inline(vec![vec![
        Button::action(texts.get("btn_confirm_delete"), confirm),
        Button::action(texts.get("btn_back"), back),
    ]])
}
