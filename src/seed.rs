//! Default dataset written on first run.

use chrono::NaiveDate;

use crate::models::{DailyStatus, DailyTask, Priority, ProjectStatus, ProjectTask};

type SeedRow = (
    &'static str,
    &'static str,
    (i32, u32, u32),
    ProjectStatus,
    Priority,
    Option<&'static str>,
);

const PROJECT_ROWS: &[SeedRow] = &[
    ("هدنة", "خطة تسويقية", (2023, 12, 1), ProjectStatus::Completed, Priority::High, None),
    ("هدنة", "خطة تنفيذية", (2023, 12, 5), ProjectStatus::Completed, Priority::High, None),
    (
        "هدنة",
        "المحتوى (بايو + ستوري + منصات)",
        (2023, 12, 10),
        ProjectStatus::InProgress,
        Priority::Medium,
        Some("التركيز على انستجرام ولينكد إن."),
    ),
    ("هدنة", "المؤثرين", (2023, 12, 15), ProjectStatus::Pending, Priority::Medium, None),
    ("هدنة", "الحملة الإبداعية", (2023, 12, 20), ProjectStatus::Pending, Priority::High, None),
    ("هدنة", "توصيل جمعيات خيرية", (2023, 12, 25), ProjectStatus::Pending, Priority::Low, None),
    ("هدنة", "قسم الولاء", (2023, 12, 30), ProjectStatus::Pending, Priority::Low, None),
    (
        "جلاس",
        "ارسال الايميل لجمهور سماوة",
        (2023, 11, 20),
        ProjectStatus::Completed,
        Priority::High,
        None,
    ),
    ("جلاس", "قائمة لدعوات جلاس", (2023, 11, 22), ProjectStatus::Completed, Priority::Medium, None),
    ("جلاس", "المحتوى العضوي", (2023, 11, 25), ProjectStatus::InProgress, Priority::Medium, None),
    (
        "جلاس",
        "إرسال الدعوات المجانية",
        (2023, 11, 28),
        ProjectStatus::Pending,
        Priority::Medium,
        None,
    ),
    ("جلاس", "إنشاء أوتوماتيك", (2023, 12, 1), ProjectStatus::Pending, Priority::Low, None),
    ("جلاس", "إرسال الدعوات", (2023, 12, 5), ProjectStatus::Pending, Priority::High, None),
];

/// Sample project tasks covering two projects.
pub fn project_tasks() -> Vec<ProjectTask> {
    PROJECT_ROWS
        .iter()
        .map(|&(project, name, (y, m, d), status, priority, notes)| {
            let mut task = ProjectTask::new(project, name);
            task.delivery_date = NaiveDate::from_ymd_opt(y, m, d);
            task.status = status;
            task.priority = Some(priority);
            task.notes = notes.map(str::to_string);
            task
        })
        .collect()
}

/// Sample daily tasks: one finished `today`, one still on the planner.
pub fn daily_tasks(today: NaiveDate) -> Vec<DailyTask> {
    let mut standup = DailyTask::new("الاجتماع الصباحي");
    standup.duration = "30m".to_string();
    standup.link_notes = "مناقشة المهام اليومية".to_string();
    standup.status = DailyStatus::Done;
    standup.completed_date = Some(today);

    let mut review = DailyTask::new("مراجعة الأكواد");
    review.duration = "1h".to_string();
    review.link_notes = "PR #402".to_string();

    vec![standup, review]
}
