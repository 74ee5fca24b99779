use crate::client::actions::TaskActions;
use crate::client::form::{FormError, TaskForm};
use crate::task::{ActionResponse, Task, TaskPatch};

pub const FETCH_FAILED: &str = "Failed to fetch tasks";

/// What the task view is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardMode {
    /// Only the task list.
    List,
    /// The list plus an empty form for a new task.
    Creating,
    /// The list plus a form seeded from the selected task.
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// State behind the task list view.
///
/// The task list only ever changes by being replaced with a fresh fetch.
/// Every mutation is awaited and then followed by a re-fetch, whether it
/// succeeded or not, so the list always reflects what the server holds.
pub struct TaskBoard<A> {
    actions: A,
    tasks: Vec<Task>,
    form_visible: bool,
    selected_task: Option<Task>,
    is_loading: bool,
    is_submitting: bool,
    notifications: Vec<Notification>,
}

impl<A: TaskActions> TaskBoard<A> {
    pub fn new(actions: A) -> Self {
        Self {
            actions,
            tasks: Vec::new(),
            form_visible: false,
            selected_task: None,
            is_loading: true,
            is_submitting: false,
            notifications: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_form_visible(&self) -> bool {
        self.form_visible
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Removes and returns the pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn mode(&self) -> BoardMode {
        match (self.form_visible, &self.selected_task) {
            (false, _) => BoardMode::List,
            (true, None) => BoardMode::Creating,
            (true, Some(_)) => BoardMode::Editing,
        }
    }

    /// The form to show: seeded from the selected task, or empty.
    pub fn form(&self) -> TaskForm {
        self.selected_task
            .as_ref()
            .map(TaskForm::from_task)
            .unwrap_or_default()
    }

    /// Loads the task list for the first time.
    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Replaces the task list with the server's current one.
    ///
    /// On failure the previous list is kept and an error is queued.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&mut self) {
        self.is_loading = true;
        match self.actions.list_tasks().await {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => {
                tracing::warn!("Failed to fetch tasks: {}", err);
                self.notifications.push(Notification::error(FETCH_FAILED));
            }
        }
        self.is_loading = false;
    }

    /// Opens the empty form, or closes whichever form is open.
    pub fn toggle_form(&mut self) {
        self.form_visible = !self.form_visible;
        self.selected_task = None;
    }

    /// Opens the form for editing `task`.
    pub fn edit(&mut self, task: Task) {
        self.selected_task = Some(task);
        self.form_visible = true;
    }

    /// Flips the completion flag of `task` on the server.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_completion(&mut self, task: &Task) {
        let patch = TaskPatch::completion(!task.is_completed());
        let response = self.actions.update_task(task.id().to_string(), patch).await;
        self.notify(response, "Failed to update task");
        self.refresh().await;
    }

    /// Submits `form` as an update of the selected task, or as a new task.
    ///
    /// An invalid form is rejected before anything is sent and leaves the
    /// board unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&mut self, form: &TaskForm) -> Result<(), FormError> {
        self.is_submitting = true;
        let actions = &self.actions;
        let selected_id = self.selected_task.as_ref().map(|task| task.id().to_string());
        let result = form
            .submit(|draft| async move {
                match selected_id {
                    Some(id) => actions.update_task(id, draft.into_patch()).await,
                    None => actions.create_task(draft.into_new_task()).await,
                }
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.is_submitting = false;
                return Err(err);
            }
        };
        self.notify(response, "Failed to save task");
        self.selected_task = None;
        self.form_visible = false;
        self.refresh().await;
        self.is_submitting = false;
        Ok(())
    }

    /// Deletes `task` on the server.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self, task: &Task) {
        let response = self.actions.delete_task(task.id().to_string()).await;
        self.notify(response, "Failed to delete task");
        self.refresh().await;
    }

    fn notify(&mut self, response: ActionResponse, fallback: &str) {
        let message = response.message.unwrap_or_else(|| fallback.to_string());
        let notification = if response.success {
            Notification::success(message)
        } else {
            Notification::error(message)
        };
        self.notifications.push(notification);
    }
}
