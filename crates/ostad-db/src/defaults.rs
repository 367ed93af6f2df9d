//! Default bot texts, seeded on first start. Admins edit them from the
//! panel; placeholders are written `{name}`.

pub const DEFAULT_TEXTS: &[(&str, &str)] = &[
    // -- Main menu --
    ("welcome", "🤖 Welcome to the professor bank!\nShare what a course was really like, or read what others wrote."),
    ("rules", "📜 Rules and FAQ\n\n1. Be honest about your experience.\n2. No insults or personal attacks.\n3. Every review is checked by an admin before it is published."),
    ("btn_submit_experience", "📝 Submit experience"),
    ("btn_my_experiences", "📂 My experiences"),
    ("btn_rules", "📜 Rules"),
    ("btn_cancel", "❌ Cancel"),
    ("unknown_command", "I did not understand that. Use the menu below."),
    ("operation_cancelled", "Operation cancelled."),
    ("button_expired", "This button has expired."),
    ("use_buttons", "Please use the buttons below."),
    ("error_generic", "⚠️ Something went wrong. Please try again."),
    ("error_invalid_input", "⚠️ That input is not valid."),
    ("item_not_found", "This item no longer exists."),
    ("not_an_admin", "🚫 You are not allowed to do that."),
    // -- Force subscribe --
    ("join_required", "🔒 Please join the channels below to use the bot, then press the check button."),
    ("btn_join_channel", "Join channel {n}"),
    ("btn_check_membership", "✅ I have joined"),
    ("membership_confirmed", "Thanks for joining!"),
    ("membership_check_failed", "⚠️ Membership check failed for channel {channel}: {error}\nMake sure the bot is an admin there."),
    ("still_not_member", "You have not joined every required channel yet."),
    // -- Submission --
    ("submission_start", "✅ Let's record your experience.\n\nChoose your field of study:"),
    ("no_fields_available", "No fields of study have been added yet. Please try again later."),
    ("no_majors_available", "This field has no majors yet."),
    ("no_courses_available", "This major has no courses yet."),
    ("choose_major", "📚 Now choose your major:"),
    ("choose_course", "📝 Choose the course:"),
    ("choose_professor", "👨🏻‍🏫 Choose the professor. If they are not listed, press \"Add new professor\"."),
    ("btn_add_new_professor", "➕ Add new professor"),
    ("add_new_professor_prompt", "Type the professor's full name:"),
    ("ask_teaching_style", "✏️ Describe the professor's teaching style."),
    ("ask_notes", "📚 Does the professor provide lecture notes or recommend a textbook?"),
    ("ask_project", "💻 Does the course have a project? If so, describe it."),
    ("ask_attendance_choice", "🕘 Is attendance required?"),
    ("btn_yes", "Yes"),
    ("btn_no", "No"),
    ("ask_attendance_details", "Describe how attendance is handled."),
    ("ask_exam", "⭕️ Describe the final exam."),
    ("ask_conclusion", "⚠️ Finally, what would you recommend to other students?"),
    ("submission_success", "👌 Your experience was saved and sent to the admins for review. Thank you!"),
    ("error_text_empty", "The text cannot be empty. Please try again."),
    ("error_text_too_long", "The text is too long ({actual} characters, at most {max}). Please shorten it."),
    ("error_not_a_number", "Please send a number."),
    // -- Experience rendering --
    ("exp_format_field", "🎓 Field"),
    ("exp_format_professor", "👨🏻‍🏫 Professor"),
    ("exp_format_course", "📝 Course"),
    ("exp_format_teaching", "✏️ Teaching style"),
    ("exp_format_notes", "📚 Notes and textbook"),
    ("exp_format_project", "💻 Project"),
    ("exp_format_attendance", "🕘 Attendance"),
    ("exp_format_attendance_yes", "required"),
    ("exp_format_attendance_no", "not required"),
    ("exp_format_exam", "⭕️ Exam"),
    ("exp_format_conclusion", "⚠️ Conclusion"),
    ("exp_format_footer", "➖➖➖➖➖"),
    ("exp_format_tags", "🏷"),
    ("redacted_placeholder", "[removed at the professor's request]"),
    // -- Statuses --
    ("status_pending", "⏳ pending"),
    ("status_approved", "✅ approved"),
    ("status_rejected", "❌ rejected"),
    // -- Moderation --
    ("admin_experience_header", "Experience #{id} from user {user_id} ({status})"),
    ("admin_new_experience_notification", "🆕 New experience #{id} is waiting for review."),
    ("btn_approve", "✅ Approve"),
    ("btn_reject", "❌ Reject"),
    ("btn_redact", "🧹 Redact"),
    ("btn_back", "🔙 Back"),
    ("rejection_reason_prompt", "Why is this experience rejected?"),
    ("btn_reject_reason_incomplete", "Incomplete"),
    ("btn_reject_reason_insulting", "Insulting language"),
    ("btn_reject_reason_irrelevant", "Irrelevant"),
    ("user_approval_notification", "🎉 Your experience about {professor} ({course}) was approved and published."),
    ("user_rejection_notification", "Your experience about {professor} ({course}) was rejected.\nReason: {reason}"),
    ("admin_approval_success", "✅ Experience #{id} approved by {admin}."),
    ("admin_rejection_success", "❌ Experience #{id} rejected by {admin}: {reason}"),
    ("admin_redact_success", "🧹 Experience #{id} was redacted."),
    ("admin_experience_withdrawn", "✏️ Experience #{id} was withdrawn by its author for editing."),
    ("already_decided", "Already handled, current status: {status}"),
    ("experience_not_found", "This experience no longer exists."),
    ("already_redacted", "This post is already redacted."),
    ("redact_not_published", "Only published experiences can be redacted."),
    ("redact_success", "Post redacted."),
    // -- Submitter's own experiences --
    ("my_experiences_empty", "You have not submitted any experience yet."),
    ("my_experiences_header", "📂 Your experiences:"),
    ("own_experience_status", "Status: {status}"),
    ("btn_edit_experience", "✏️ Edit"),
    ("btn_resubmit", "🔁 Send for review again"),
    ("btn_confirm", "✅ Confirm"),
    ("confirm_edit_experience", "Editing removes this submission and starts a new one. Continue?"),
    ("edit_started", "Your old submission was removed. Let's write it again."),
    ("resubmit_success", "🔁 Your experience was sent for review again."),
    ("already_pending", "This experience is already waiting for review."),
    ("edit_not_pending", "Only experiences waiting for review can be edited."),
    // -- Search --
    ("search_usage", "Usage: /search <professor or course name>"),
    ("find_usage", "Usage: /find <professor or course name>"),
    ("search_no_results", "Nothing found for \"{query}\"."),
    // -- Admin panel --
    ("admin_panel_welcome", "🔐 Welcome to the admin panel."),
    ("btn_admin_fields", "🎓 Fields"),
    ("btn_admin_majors", "📚 Majors"),
    ("btn_admin_courses", "📝 Courses"),
    ("btn_admin_professors", "👨🏻‍🏫 Professors"),
    ("btn_admin_review_queue", "⏳ Review queue"),
    ("btn_admin_admins", "👮 Admins"),
    ("btn_admin_texts", "💬 Texts"),
    ("btn_admin_channels", "📢 Channels"),
    ("btn_admin_stats", "📊 Stats"),
    ("btn_admin_broadcast", "📣 Broadcast"),
    ("btn_admin_direct_message", "✉️ Message a user"),
    ("btn_back_to_panel", "🔙 Back to panel"),
    ("btn_prev_page", "◀️ Previous"),
    ("btn_next_page", "Next ▶️"),
    ("btn_confirm_delete", "🗑 Delete"),
    ("btn_add_item", "➕ Add {kind}"),
    ("btn_add_admin", "➕ Add admin"),
    ("btn_add_channel", "➕ Add channel"),
    ("btn_toggle_force_subscribe", "🔁 Toggle force subscribe"),
    ("kind_field", "field"),
    ("kind_major", "major"),
    ("kind_course", "course"),
    ("kind_professor", "professor"),
    ("admin_manage_field_header", "🎓 Fields ({total})"),
    ("admin_manage_major_header", "📚 Majors ({total})"),
    ("admin_manage_course_header", "📝 Courses ({total})"),
    ("admin_manage_professor_header", "👨🏻‍🏫 Professors ({total})"),
    ("admin_manage_admins_header", "👮 Admins ({total})"),
    ("admin_manage_texts_header", "💬 Choose a text to edit:"),
    ("admin_manage_channels_header", "📢 Required channels ({total})\nForce subscribe: {status}"),
    ("force_subscribe_on", "on"),
    ("force_subscribe_off", "off"),
    ("force_subscribe_toggled", "Force subscribe toggled."),
    ("select_parent_field", "Choose the parent field:"),
    ("select_parent_major", "Choose the parent major:"),
    ("ask_for_new_item_name", "Type the name of the new {kind}:"),
    ("ask_for_update_item_name", "Type the new name for \"{name}\":"),
    ("item_added_successfully", "✅ \"{name}\" added."),
    ("item_updated_successfully", "✏️ Renamed to \"{name}\"."),
    ("item_deleted_successfully", "🗑️ \"{name}\" deleted."),
    ("item_in_use", "\"{name}\" is used by {count} experience(s) and cannot be deleted."),
    ("item_conflict", "An item with this name already exists. Type another name:"),
    ("confirm_delete", "⚠️ Delete \"{name}\"? This cannot be undone."),
    ("confirm_delete_cascade", "⚠️ Delete \"{name}\"?\n\nEverything under it is deleted too. This cannot be undone."),
    ("ask_admin_id", "Send the numeric user id of the new admin:"),
    ("admin_added", "✅ User {id} is now an admin."),
    ("admin_already_exists", "User {id} is already an admin."),
    ("admin_removed", "🗑️ User {id} is no longer an admin."),
    ("cannot_delete_owner", "The owner cannot be removed."),
    ("ask_for_update_text_value", "Current value of \"{key}\":\n\n{value}\n\nSend the new value:"),
    ("text_updated", "✅ Text \"{key}\" updated."),
    ("ask_channel_id", "Send the numeric id of the channel (the bot must be an admin there):"),
    ("ask_channel_link", "Send the invite link of the channel:"),
    ("error_invalid_link", "That is not a valid link. It must start with https://"),
    ("channel_added", "✅ Channel {id} added."),
    ("channel_removed", "🗑️ Channel {id} removed."),
    ("admin_stats", "📊 Stats\n\nUsers: {users}\nPending: {pending}\nApproved: {approved}\nRejected: {rejected}\n\nFields: {fields}\nMajors: {majors}\nCourses: {courses}\nProfessors: {professors}"),
    ("review_queue_header", "⏳ {total} experience(s) waiting for review:"),
    ("review_queue_empty", "The review queue is empty."),
    ("ask_broadcast_message", "Send the message to broadcast to every user:"),
    ("broadcast_started", "📣 Broadcast started. You will get a report when it is done."),
    ("broadcast_finished", "📣 Broadcast finished: {sent} delivered, {failed} failed."),
    ("ask_user_id", "Send the numeric id of the user:"),
    ("ask_direct_message", "Send the message for user {id}:"),
    ("direct_message_sent", "✅ Message delivered to {id}."),
    ("direct_message_failed", "⚠️ Could not deliver to {id}: {error}"),
    // -- Maintenance --
    ("backup_completed", "💾 Backup {file}\nSize: {size} bytes\nSHA-256: {sha256}"),
];
