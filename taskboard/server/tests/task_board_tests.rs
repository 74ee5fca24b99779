use taskboard_server::client::{
    BoardMode, LocalTaskActions, Notification, NotificationLevel, TaskBoard, TaskForm,
};

mod common;

pub struct TestContext {
    pub board: TaskBoard<LocalTaskActions>,
}

async fn setup() -> anyhow::Result<TestContext> {
    let store = common::setup_store().await?;
    let mut board = TaskBoard::new(LocalTaskActions::new(store));
    board.mount().await;
    Ok(TestContext { board })
}

fn titled(title: &str) -> TaskForm {
    TaskForm {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn can_mount_empty_board() {
    let state = setup().await.expect("Failed to setup test context");

    assert!(state.board.tasks().is_empty());
    assert!(!state.board.is_loading());
    assert_eq!(state.board.mode(), BoardMode::List);
    assert!(state.board.notifications().is_empty());
}

#[tokio::test]
async fn can_create_edit_complete_and_delete_task() {
    let mut state = setup().await.expect("Failed to setup test context");
    let board = &mut state.board;

    board.toggle_form();
    board
        .submit(&TaskForm {
            description: "2 litres".to_string(),
            due_date: "2025-07-14T09:15".to_string(),
            ..titled("Buy milk")
        })
        .await
        .expect("form is valid");
    assert_eq!(board.mode(), BoardMode::List);
    assert_eq!(board.tasks().len(), 1);
    assert_eq!(board.tasks()[0].description(), Some("2 litres"));

    let task = board.tasks()[0].clone();
    board.edit(task.clone());
    let mut form = board.form();
    assert_eq!(form.due_date, "2025-07-14T09:15");
    form.title = "Buy oat milk".to_string();
    form.description.clear();
    board.submit(&form).await.expect("form is valid");

    let edited = board.tasks()[0].clone();
    assert_eq!(edited.id(), task.id());
    assert_eq!(edited.title(), "Buy oat milk");
    assert_eq!(edited.description(), None);
    assert_eq!(edited.due_date(), task.due_date());
    assert_eq!(edited.created_at(), task.created_at());

    board.toggle_completion(&edited).await;
    assert!(board.tasks()[0].is_completed());

    let completed = board.tasks()[0].clone();
    board.delete(&completed).await;
    assert!(board.tasks().is_empty());

    let levels: Vec<_> = board
        .take_notifications()
        .into_iter()
        .map(|notification| notification.level)
        .collect();
    assert_eq!(levels, vec![NotificationLevel::Success; 4]);
}

#[tokio::test]
async fn can_show_newest_task_first() {
    let mut state = setup().await.expect("Failed to setup test context");
    let board = &mut state.board;

    for title in ["T1", "T2"] {
        board.toggle_form();
        board.submit(&titled(title)).await.expect("form is valid");
    }

    let titles: Vec<_> = board.tasks().iter().map(|task| task.title()).collect();
    assert_eq!(titles, vec!["T2", "T1"]);
}

#[tokio::test]
async fn can_surface_failure_when_task_already_deleted() {
    let mut state = setup().await.expect("Failed to setup test context");
    let board = &mut state.board;
    board.toggle_form();
    board.submit(&titled("T")).await.expect("form is valid");
    let task = board.tasks()[0].clone();
    board.delete(&task).await;
    board.take_notifications();

    board.toggle_completion(&task).await;

    assert!(board.tasks().is_empty());
    assert_eq!(
        board.notifications(),
        &[Notification::error("Task not found")]
    );
}
