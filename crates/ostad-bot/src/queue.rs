//! Per-user update queues for transports that receive updates one request
//! at a time.
//!
//! `push` runs synchronously in the receiving handler, so the queue order
//! is the arrival order. Each user with queued updates has exactly one
//! worker task draining them; it exits as soon as the queue is empty.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use ostad_types::models::UserId;
use ostad_types::update::Update;

use crate::{AppState, dispatcher};

pub struct UpdateQueue {
    state: AppState,
    senders: Mutex<HashMap<UserId, mpsc::UnboundedSender<Update>>>,
}

impl UpdateQueue {
    pub fn new(state: AppState) -> Arc<Self> {
        Arc::new(Self {
            state,
            senders: Mutex::new(HashMap::new()),
        })
    }

    /// Queue `update` behind everything already queued for its sender.
    pub fn push(self: &Arc<Self>, update: Update) {
        let user_id = update.sender().id;
        let mut senders = self.senders();

        let update = match senders.get(&user_id) {
            Some(tx) => match tx.send(update) {
                Ok(()) => return,
                // worker is gone (it panicked); start a new one
                Err(mpsc::error::SendError(update)) => update,
            },
            None => update,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(update).is_ok() {
            senders.insert(user_id, tx);
            tokio::spawn(self.clone().drain(user_id, rx));
        }
    }

    /// True when no user has a queued or running update.
    pub fn is_idle(&self) -> bool {
        self.senders().is_empty()
    }

    async fn drain(self: Arc<Self>, user_id: UserId, mut rx: mpsc::UnboundedReceiver<Update>) {
        loop {
            // The emptiness check and the retirement happen under the map
            // lock, so a concurrent push either lands here or starts a
            // fresh worker after this one is done.
            let next = {
                let mut senders = self.senders();
                match rx.try_recv() {
                    Ok(update) => Some(update),
                    Err(_) => {
                        senders.remove(&user_id);
                        None
                    }
                }
            };
            match next {
                Some(update) => dispatcher::handle_update(&self.state, update).await,
                None => {
                    debug!("Update queue of user {} drained", user_id);
                    return;
                }
            }
        }
    }

    fn senders(&self) -> MutexGuard<'_, HashMap<UserId, mpsc::UnboundedSender<Update>>> {
        self.senders.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ostad_types::action::Action;

    use super::*;
    use crate::testing::{OWNER, seed_registry, sender, test_state};

    const USER: UserId = 60;

    fn text(body: &str) -> Update {
        Update::Message {
            from: sender(USER),
            chat_id: USER,
            text: body.to_string(),
        }
    }

    fn press(n: usize, action: Action) -> Update {
        Update::Callback {
            id: format!("cb-{n}"),
            from: sender(USER),
            message: None,
            action: Some(action),
        }
    }

    async fn settle(queue: &UpdateQueue) {
        for _ in 0..500 {
            if queue.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("queue did not drain");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_users_updates_run_in_arrival_order() {
        let (state, _) = test_state();
        let reg = seed_registry(&state);
        let queue = UpdateQueue::new(state.clone());

        let label = state.texts.get("btn_submit_experience");
        queue.push(text(&label));
        queue.push(press(1, Action::SelectField(reg.field)));
        queue.push(press(2, Action::SelectMajor(reg.major)));
        queue.push(press(3, Action::SelectCourse(reg.course)));
        queue.push(press(4, Action::AddNewProfessor));
        for body in ["Dr. Smith", "Good", "Good", "Good"] {
            queue.push(text(body));
        }
        queue.push(press(5, Action::Attendance(false)));
        for body in ["Online only", "Good", "Good"] {
            queue.push(text(body));
        }
        // another user's traffic interleaves freely
        queue.push(Update::Message {
            from: sender(OWNER),
            chat_id: OWNER,
            text: "/rules".into(),
        });

        settle(&queue).await;

        let stored = state.db.experiences_by_user(USER).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].attendance_details, "Online only");
        assert!(!stored[0].attendance_required);
        assert_eq!(state.sessions.load(USER).unwrap(), None);
    }

    #[tokio::test]
    async fn drained_queue_accepts_new_work() {
        let (state, messenger) = test_state();
        let queue = UpdateQueue::new(state.clone());

        queue.push(text("/rules"));
        settle(&queue).await;
        queue.push(text("/rules"));
        settle(&queue).await;

        assert_eq!(messenger.texts_to(USER).len(), 2);
    }
}
