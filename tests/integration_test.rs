use chrono::Utc;
use edu_admin::error::{AppError, AppResult, BusinessError, ValidationError};
use edu_admin::models::{
    AdminUser, AuditLogEntry, Course, EduUnit, FileBlob, ImportSession, ImportStatus, Invitation,
    NewImportSession, NewInvitation, NewUser, ParsedPaperData, PaperMetadata, ReviewQuestion, Role,
    Subject,
};
use edu_admin::orchestrator::PaperImporter;
use edu_admin::repositories::catalogue::sibling_units;
use edu_admin::repositories::questions::QuestionRow;
use edu_admin::repositories::{
    AuditLogRepository, CatalogueRepository, ImportSessionRepository, ObjectStore, QuestionRepository,
    UserRepository,
};
use edu_admin::services::{UserAdminService, WarnWriter};
use edu_admin::wizard::{MemoryCheckpoint, StepStatus, WizardController, WizardStep};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ========== 内存实现 ==========

/// 导入会话表
#[derive(Clone, Default)]
struct FakeSessions {
    rows: Arc<Mutex<HashMap<String, ImportSession>>>,
    /// 标记完成总是失败
    reject_completion: Arc<AtomicBool>,
}

impl FakeSessions {
    fn insert(&self, session: ImportSession) {
        self.rows.lock().unwrap().insert(session.id.clone(), session);
    }

    fn get(&self, id: &str) -> Option<ImportSession> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

fn session(id: &str, status: ImportStatus, data: ParsedPaperData) -> ImportSession {
    ImportSession {
        id: id.to_string(),
        file_name: "paper.toml".to_string(),
        file_path: None,
        parsed_data: data,
        status,
        paper_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

impl ImportSessionRepository for FakeSessions {
    async fn create(&self, new: &NewImportSession) -> AppResult<ImportSession> {
        let id = format!("s{}", self.rows.lock().unwrap().len() + 1);
        let mut created = session(&id, new.status, new.parsed_data.clone());
        created.file_name = new.file_name.clone();
        created.file_path = new.file_path.clone();
        self.insert(created.clone());
        Ok(created)
    }

    async fn fetch(&self, id: &str) -> AppResult<Option<ImportSession>> {
        Ok(self.get(id))
    }

    async fn update_data(&self, id: &str, data: &ParsedPaperData, status: ImportStatus) -> AppResult<ImportSession> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| AppError::bad_response("question_import_sessions", 404, "not found"))?;
        row.parsed_data = data.clone();
        row.status = status;
        Ok(row.clone())
    }

    async fn attach_paper(&self, id: &str, paper_id: &str) -> AppResult<ImportSession> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| AppError::bad_response("question_import_sessions", 404, "not found"))?;
        row.paper_id = Some(paper_id.to_string());
        Ok(row.clone())
    }

    async fn mark_completed(&self, id: &str, paper_id: &str) -> AppResult<ImportSession> {
        if self.reject_completion.load(Ordering::SeqCst) {
            return Err(AppError::bad_response("question_import_sessions", 503, "service unavailable"));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| AppError::bad_response("question_import_sessions", 404, "not found"))?;
        row.status = ImportStatus::Completed;
        row.paper_id = Some(paper_id.to_string());
        Ok(row.clone())
    }
}

/// 存储 + 题库
#[derive(Default)]
struct FakeGateway {
    objects: Mutex<Vec<String>>,
    papers: Mutex<Vec<String>>,
    rows: Mutex<Vec<QuestionRow>>,
    /// 下一次写入题目失败
    fail_next_insert: AtomicBool,
}

impl ObjectStore for FakeGateway {
    async fn put_object(&self, bucket: &str, path: &str, _blob: &FileBlob) -> AppResult<String> {
        self.objects.lock().unwrap().push(path.to_string());
        Ok(format!("https://cdn.test/{}/{}", bucket, path))
    }

    async fn remove(&self, _bucket: &str, paths: &[String]) -> AppResult<()> {
        self.objects.lock().unwrap().retain(|p| !paths.contains(p));
        Ok(())
    }
}

impl QuestionRepository for FakeGateway {
    async fn create_paper(&self, paper: &ParsedPaperData, _session_id: &str) -> AppResult<String> {
        let mut papers = self.papers.lock().unwrap();
        papers.push(paper.metadata.title.clone());
        Ok(format!("p{}", papers.len()))
    }

    async fn insert_questions(&self, rows: &[QuestionRow]) -> AppResult<usize> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::bad_response("questions", 500, "connection reset"));
        }
        self.rows.lock().unwrap().extend(rows.iter().cloned());
        Ok(rows.len())
    }
}

const PAPER_TOML: &str = r#"
[metadata]
title = "2024 七年级期末数学"
subject = "数学"
grade = "七年级"
year = 2024

[[questions]]
number = 1
stem = "1 + 1 = ?"
question_type = "single_choice"
marks = 3.0
answer = "B"
attachments = ["figs/q1.png"]

[[questions]]
number = 2
stem = "解方程 2x = 6"
question_type = "calculation"
marks = 5.0

[[questions]]
number = 3
stem = ""
marks = 2.0
"#;

fn sample_data(title: &str) -> ParsedPaperData {
    let mut q = ReviewQuestion::new(1, "计算 3 × 4");
    q.marks = 4.0;
    ParsedPaperData {
        metadata: PaperMetadata {
            title: title.to_string(),
            subject: "数学".to_string(),
            year: "2024".to_string(),
            ..Default::default()
        },
        structure: Vec::new(),
        questions: vec![q],
    }
}

// ========== 向导断点 ==========

#[tokio::test]
async fn stale_checkpoint_is_cleared_on_initialize() {
    let checkpoint = MemoryCheckpoint::with_session("gone");
    let mut wizard = WizardController::new(FakeSessions::default(), &checkpoint);

    assert!(!wizard.initialize().await);
    assert_eq!(checkpoint.peek(), None);
    assert_eq!(wizard.current_step(), WizardStep::Upload);
    assert!(wizard.session().is_none());
}

#[tokio::test]
async fn finished_session_in_checkpoint_starts_fresh() {
    let sessions = FakeSessions::default();
    sessions.insert(session("s9", ImportStatus::Completed, sample_data("旧试卷")));
    let checkpoint = MemoryCheckpoint::with_session("s9");
    let mut wizard = WizardController::new(sessions, &checkpoint);

    assert!(!wizard.initialize().await);
    assert_eq!(checkpoint.peek(), None);
}

#[tokio::test]
async fn resumed_session_continues_to_completion() {
    let sessions = FakeSessions::default();
    sessions.insert(session("s7", ImportStatus::Processing, sample_data("期中测验")));
    let checkpoint = MemoryCheckpoint::with_session("s7");
    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);

    assert!(wizard.initialize().await);
    assert_eq!(wizard.current_step(), WizardStep::Metadata);
    assert_eq!(wizard.state().status(WizardStep::Upload), StepStatus::Completed);
    assert_eq!(wizard.session_id(), Some("s7"));

    let gateway = FakeGateway::default();
    let dir = tempfile::tempdir().unwrap();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let outcome = importer.continue_session(&mut wizard).await.unwrap();
    assert_eq!(outcome.session_id, "s7");
    assert_eq!(outcome.imported, 1);

    let stored = sessions.get("s7").unwrap();
    assert_eq!(stored.status, ImportStatus::Completed);
    assert_eq!(stored.paper_id.as_deref(), Some(outcome.paper_id.as_str()));
    assert_eq!(checkpoint.peek(), None);
}

// ========== 完整导入 ==========

#[tokio::test]
async fn import_file_runs_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let paper_path = dir.path().join("期末.toml");
    tokio::fs::write(&paper_path, PAPER_TOML).await.unwrap();
    tokio::fs::create_dir_all(dir.path().join("figs")).await.unwrap();
    tokio::fs::write(dir.path().join("figs/q1.png"), [0x89u8, 0x50, 0x4e, 0x47])
        .await
        .unwrap();

    let sessions = FakeSessions::default();
    let checkpoint = MemoryCheckpoint::new();
    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);
    let gateway = FakeGateway::default();
    let warn_path = dir.path().join("warn.txt");
    let warn = WarnWriter::with_path(warn_path.display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let outcome = importer.import_file(&mut wizard, &paper_path).await.unwrap();

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.attachments_uploaded, 1);
    assert_eq!(outcome.statistics.total, 3);
    assert_eq!(outcome.statistics.ready_to_import, 2);

    // 原始文件 + 一个题目附件
    let objects = gateway.objects.lock().unwrap().clone();
    assert_eq!(objects.len(), 2);
    assert!(objects[0].starts_with("paper-imports/originals/"));
    assert!(objects[1].starts_with(&format!("paper-imports/{}/q1/", outcome.session_id)));

    let rows = gateway.rows.lock().unwrap().clone();
    assert_eq!(rows.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rows[0].attachments.len(), 1);
    assert!(rows[0].attachments[0].starts_with("https://cdn.test/"));
    assert_eq!(rows[0].section.as_deref(), Some("全卷"));

    let warn_text = std::fs::read_to_string(&warn_path).unwrap();
    assert!(warn_text.contains("题目 3"));
    assert!(warn_text.contains("Required: stem"));

    assert_eq!(sessions.get(&outcome.session_id).unwrap().status, ImportStatus::Completed);
    assert_eq!(checkpoint.peek(), None);
    assert_eq!(wizard.current_step(), WizardStep::Upload);
}

#[tokio::test]
async fn failed_step_keeps_checkpoint_for_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let paper_path = dir.path().join("untitled.json");
    let body = serde_json::json!({
        "metadata": { "title": "", "subject": "物理" },
        "questions": [{ "number": 1, "stem": "简述牛顿第一定律", "marks": 6.0 }]
    });
    tokio::fs::write(&paper_path, body.to_string()).await.unwrap();

    let checkpoint = MemoryCheckpoint::new();
    let mut wizard = WizardController::new(FakeSessions::default(), &checkpoint);
    let gateway = FakeGateway::default();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let err = importer.import_file(&mut wizard, &paper_path).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(ValidationError::Required { .. }))
    ));
    assert_eq!(wizard.current_step(), WizardStep::Metadata);
    assert_eq!(wizard.state().status(WizardStep::Metadata), StepStatus::Error);
    assert_eq!(checkpoint.peek().as_deref(), wizard.session_id());
    assert!(gateway.papers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn paper_without_importable_questions_is_rejected() {
    let sessions = FakeSessions::default();
    let mut data = sample_data("空卷");
    data.questions[0].stem = String::new();
    sessions.insert(session("s3", ImportStatus::Processing, data));
    let checkpoint = MemoryCheckpoint::with_session("s3");
    let mut wizard = WizardController::new(sessions, &checkpoint);
    assert!(wizard.initialize().await);

    let dir = tempfile::tempdir().unwrap();
    let gateway = FakeGateway::default();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let err = importer.continue_session(&mut wizard).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Business(BusinessError::EmptyPaper { .. }))
    ));
    assert_eq!(wizard.state().status(WizardStep::Questions), StepStatus::Error);
    assert!(gateway.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn completion_bookkeeping_failure_still_finishes_import() {
    let dir = tempfile::tempdir().unwrap();
    let paper_path = dir.path().join("期末.toml");
    tokio::fs::write(&paper_path, PAPER_TOML).await.unwrap();

    let sessions = FakeSessions::default();
    sessions.reject_completion.store(true, Ordering::SeqCst);
    let checkpoint = MemoryCheckpoint::new();
    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);
    let gateway = FakeGateway::default();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let outcome = importer.import_file(&mut wizard, &paper_path).await.unwrap();

    assert_eq!(outcome.imported, 2);
    assert_eq!(checkpoint.peek(), None);
    assert_eq!(gateway.papers.lock().unwrap().len(), 1);

    // 状态没能更新，但试卷ID已随创建写入会话
    let stored = sessions.get(&outcome.session_id).unwrap();
    assert_eq!(stored.status, ImportStatus::Processing);
    assert_eq!(stored.paper_id.as_deref(), Some(outcome.paper_id.as_str()));
}

#[tokio::test]
async fn retry_after_question_insert_failure_reuses_created_paper() {
    let sessions = FakeSessions::default();
    sessions.insert(session("s5", ImportStatus::Processing, sample_data("单元测验")));
    let checkpoint = MemoryCheckpoint::with_session("s5");
    let gateway = FakeGateway::default();
    gateway.fail_next_insert.store(true, Ordering::SeqCst);
    let dir = tempfile::tempdir().unwrap();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);
    assert!(wizard.initialize().await);
    importer.continue_session(&mut wizard).await.unwrap_err();

    assert_eq!(checkpoint.peek().as_deref(), Some("s5"));
    assert_eq!(sessions.get("s5").unwrap().paper_id.as_deref(), Some("p1"));

    // 下次运行：从断点恢复，不再重复创建试卷
    let mut next_run = WizardController::new(sessions.clone(), &checkpoint);
    assert!(next_run.initialize().await);
    let outcome = importer.continue_session(&mut next_run).await.unwrap();

    assert_eq!(outcome.paper_id, "p1");
    assert_eq!(gateway.papers.lock().unwrap().len(), 1);
    assert_eq!(gateway.rows.lock().unwrap().len(), 1);
    assert_eq!(sessions.get("s5").unwrap().status, ImportStatus::Completed);
    assert_eq!(checkpoint.peek(), None);
}

#[tokio::test]
async fn resumed_session_with_bad_data_reimports_corrected_file() {
    let dir = tempfile::tempdir().unwrap();
    let paper_path = dir.path().join("期末.toml");
    // 文件已修正，会话里仍是缺少标题的旧数据
    tokio::fs::write(&paper_path, PAPER_TOML).await.unwrap();

    let sessions = FakeSessions::default();
    let mut stale = session("s1", ImportStatus::Processing, sample_data(""));
    stale.file_name = paper_path.display().to_string();
    sessions.insert(stale);
    let checkpoint = MemoryCheckpoint::with_session("s1");
    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);
    assert!(wizard.initialize().await);

    let gateway = FakeGateway::default();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let outcome = importer.resume(&mut wizard).await.unwrap();

    assert_ne!(outcome.session_id, "s1");
    assert_eq!(outcome.imported, 2);
    assert_eq!(sessions.get("s1").unwrap().status, ImportStatus::Failed);
    assert_eq!(
        sessions.get(&outcome.session_id).unwrap().status,
        ImportStatus::Completed
    );
    assert_eq!(*gateway.papers.lock().unwrap(), vec!["2024 七年级期末数学"]);
    assert_eq!(checkpoint.peek(), None);
}

#[tokio::test]
async fn resumed_session_without_source_file_reports_error() {
    let sessions = FakeSessions::default();
    sessions.insert(session("s4", ImportStatus::Processing, sample_data("")));
    let checkpoint = MemoryCheckpoint::with_session("s4");
    let mut wizard = WizardController::new(sessions.clone(), &checkpoint);
    assert!(wizard.initialize().await);

    let dir = tempfile::tempdir().unwrap();
    let gateway = FakeGateway::default();
    let warn = WarnWriter::with_path(dir.path().join("warn.txt").display().to_string());
    let importer = PaperImporter::new(&gateway, &warn);

    let err = importer.resume(&mut wizard).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(ValidationError::Required { .. }))
    ));
    assert_eq!(sessions.get("s4").unwrap().status, ImportStatus::Processing);
    assert_eq!(checkpoint.peek().as_deref(), Some("s4"));
}

// ========== 教学目录 ==========

#[derive(Default)]
struct FakeCatalogue {
    calls: Mutex<Vec<String>>,
}

fn course(id: &str, subject_id: &str) -> Course {
    Course {
        id: id.to_string(),
        subject_id: subject_id.to_string(),
        name: id.to_uppercase(),
    }
}

fn unit(id: &str, course_id: &str, position: i32) -> EduUnit {
    EduUnit {
        id: id.to_string(),
        course_id: course_id.to_string(),
        title: id.to_string(),
        position,
    }
}

impl CatalogueRepository for FakeCatalogue {
    async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        Ok(Vec::new())
    }

    async fn get_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        self.calls.lock().unwrap().push(format!("get_course:{}", course_id));
        Ok(match course_id {
            "c1" | "c2" => Some(course(course_id, "s1")),
            "c3" => Some(course(course_id, "s2")),
            _ => None,
        })
    }

    async fn list_courses(&self, subject_id: &str) -> AppResult<Vec<Course>> {
        self.calls.lock().unwrap().push(format!("list_courses:{}", subject_id));
        Ok(match subject_id {
            "s1" => vec![course("c2", "s1"), course("c1", "s1")],
            _ => vec![course("c3", "s2")],
        })
    }

    async fn list_units(&self, course_id: &str) -> AppResult<Vec<EduUnit>> {
        self.calls.lock().unwrap().push(format!("list_units:{}", course_id));
        Ok(match course_id {
            "c1" => vec![unit("u2", "c1", 2), unit("u1", "c1", 1)],
            "c2" => vec![unit("u3", "c2", 1)],
            _ => vec![unit("u9", "c3", 1)],
        })
    }

    async fn create_subject(&self, _name: &str, _code: Option<&str>) -> AppResult<Subject> {
        Err(AppError::bad_response("subjects", 405, "not supported"))
    }

    async fn create_course(&self, _subject_id: &str, _name: &str) -> AppResult<Course> {
        Err(AppError::bad_response("courses", 405, "not supported"))
    }

    async fn create_unit(&self, _course_id: &str, _title: &str, _position: i32) -> AppResult<EduUnit> {
        Err(AppError::bad_response("units", 405, "not supported"))
    }

    async fn delete_unit(&self, _unit_id: &str) -> AppResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn sibling_units_cover_every_course_of_the_subject() {
    let catalogue = FakeCatalogue::default();

    let units = sibling_units(&catalogue, "c1").await.unwrap();

    let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3"]);
    assert_eq!(
        *catalogue.calls.lock().unwrap(),
        vec!["get_course:c1", "list_courses:s1", "list_units:c2", "list_units:c1"]
    );
}

#[tokio::test]
async fn sibling_units_of_unknown_course_is_invalid() {
    let catalogue = FakeCatalogue::default();
    let err = sibling_units(&catalogue, "nope").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::Invalid { .. })));
    assert_eq!(catalogue.calls.lock().unwrap().len(), 1);
}

// ========== 用户管理 ==========

#[derive(Clone, Default)]
struct FakeUsers {
    users: Arc<Mutex<Vec<AdminUser>>>,
    calls: Arc<Mutex<Vec<String>>>,
    create_error: Option<String>,
}

fn admin(id: &str, email: &str) -> AdminUser {
    AdminUser {
        id: id.to_string(),
        email: email.to_string(),
        full_name: id.to_string(),
        role_id: None,
        is_active: true,
        created_at: None,
    }
}

impl UserRepository for FakeUsers {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(Vec::new())
    }

    async fn list_users(&self) -> AppResult<Vec<AdminUser>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<AdminUser>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<AdminUser> {
        self.calls.lock().unwrap().push(format!("create:{}", user.email));
        if let Some(message) = &self.create_error {
            return Err(AppError::bad_response("functions/v1/create-user", 422, message.clone()));
        }
        let created = admin(&format!("u{}", self.users.lock().unwrap().len() + 1), &user.email);
        self.users.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn create_invitation(&self, invitation: &NewInvitation) -> AppResult<Invitation> {
        self.calls.lock().unwrap().push(format!("invite:{}", invitation.email));
        Ok(Invitation {
            id: "inv1".to_string(),
            email: invitation.email.clone(),
            role_id: invitation.role_id.clone(),
            invited_by: Some(invitation.invited_by.clone()),
            created_at: None,
        })
    }

    async fn set_active(&self, id: &str, active: bool) -> AppResult<AdminUser> {
        self.calls.lock().unwrap().push(format!("set_active:{}:{}", id, active));
        let mut user = admin(id, "x@school.cn");
        user.is_active = active;
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        self.calls.lock().unwrap().push(format!("delete:{}", id));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeAudit {
    entries: Arc<Mutex<Vec<AuditLogEntry>>>,
    broken: bool,
}

impl AuditLogRepository for FakeAudit {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()> {
        if self.broken {
            return Err(AppError::bad_response("audit_logs", 500, "unavailable"));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        full_name: "王老师".to_string(),
        role_id: None,
        password: None,
    }
}

#[tokio::test]
async fn cannot_deactivate_or_delete_self() {
    let users = FakeUsers::default();
    let service = UserAdminService::new(users.clone(), FakeAudit::default(), "me");

    let err = service.set_active("me", false).await.unwrap_err();
    assert!(matches!(err, AppError::Business(BusinessError::CannotModifySelf)));
    let err = service.delete_user("me").await.unwrap_err();
    assert!(matches!(err, AppError::Business(BusinessError::CannotModifySelf)));

    assert!(users.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn backend_duplicate_is_reported_as_duplicate_email() {
    let users = FakeUsers {
        create_error: Some("User already registered".to_string()),
        ..Default::default()
    };
    let audit = FakeAudit::default();
    let service = UserAdminService::new(users, audit.clone(), "me");

    let err = service.create_user(new_user("Teacher@School.cn")).await.unwrap_err();
    match err {
        AppError::Business(BusinessError::DuplicateEmail { email }) => assert_eq!(email, "teacher@school.cn"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(audit.entries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn existing_email_is_rejected_before_calling_backend() {
    let users = FakeUsers::default();
    users.users.lock().unwrap().push(admin("u1", "teacher@school.cn"));
    let service = UserAdminService::new(users.clone(), FakeAudit::default(), "me");

    let err = service.invite("teacher@school.cn", None).await.unwrap_err();
    assert!(matches!(err, AppError::Business(BusinessError::DuplicateEmail { .. })));
    assert!(users.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mutations_are_audited_and_audit_failures_ignored() {
    let audit = FakeAudit::default();
    let service = UserAdminService::new(FakeUsers::default(), audit.clone(), "me");

    let created = service.create_user(new_user("new@school.cn")).await.unwrap();
    service.set_active(&created.id, false).await.unwrap();

    let actions: Vec<String> = audit.entries.lock().unwrap().iter().map(|e| e.action.clone()).collect();
    assert_eq!(actions, vec!["user.create", "user.deactivate"]);

    let broken = UserAdminService::new(
        FakeUsers::default(),
        FakeAudit {
            broken: true,
            ..Default::default()
        },
        "me",
    );
    assert!(broken.delete_user("someone").await.is_ok());
}

#[tokio::test]
async fn invalid_email_is_a_validation_error() {
    let users = FakeUsers::default();
    let service = UserAdminService::new(users.clone(), FakeAudit::default(), "me");

    let err = service.create_user(new_user("not-an-email")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::Invalid { .. })));
    assert!(users.calls.lock().unwrap().is_empty());
}
