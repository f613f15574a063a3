use crate::clients::{eq_filter, BackendClient};
use crate::error::{AppError, AppResult};
use crate::models::{Course, EduUnit, Subject};
use serde_json::json;
use tracing::debug;

/// 教学目录仓储（学科 / 课程 / 单元）
#[allow(async_fn_in_trait)]
pub trait CatalogueRepository {
    async fn list_subjects(&self) -> AppResult<Vec<Subject>>;

    async fn get_course(&self, course_id: &str) -> AppResult<Option<Course>>;

    async fn list_courses(&self, subject_id: &str) -> AppResult<Vec<Course>>;

    async fn list_units(&self, course_id: &str) -> AppResult<Vec<EduUnit>>;

    async fn create_subject(&self, name: &str, code: Option<&str>) -> AppResult<Subject>;

    async fn create_course(&self, subject_id: &str, name: &str) -> AppResult<Course>;

    async fn create_unit(&self, course_id: &str, title: &str, position: i32) -> AppResult<EduUnit>;

    async fn delete_unit(&self, unit_id: &str) -> AppResult<()>;
}

/// 同一学科下所有课程的单元
///
/// 先解析课程所属学科，再逐个课程读取单元
pub async fn sibling_units<R: CatalogueRepository>(repo: &R, course_id: &str) -> AppResult<Vec<EduUnit>> {
    let course = repo
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::invalid("course_id", format!("课程 {} 不存在", course_id)))?;

    let courses = repo.list_courses(&course.subject_id).await?;
    debug!("学科 {} 下共有 {} 门课程", course.subject_id, courses.len());

    let mut units = Vec::new();
    for c in &courses {
        units.extend(repo.list_units(&c.id).await?);
    }
    units.sort_by(|a, b| a.course_id.cmp(&b.course_id).then(a.position.cmp(&b.position)));
    Ok(units)
}

impl CatalogueRepository for BackendClient {
    async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        self.select("subjects", &[], Some("name.asc")).await
    }

    async fn get_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        self.select_one("courses", &[eq_filter("id", course_id)]).await
    }

    async fn list_courses(&self, subject_id: &str) -> AppResult<Vec<Course>> {
        self.select("courses", &[eq_filter("subject_id", subject_id)], Some("name.asc"))
            .await
    }

    async fn list_units(&self, course_id: &str) -> AppResult<Vec<EduUnit>> {
        self.select("edu_units", &[eq_filter("course_id", course_id)], Some("position.asc"))
            .await
    }

    async fn create_subject(&self, name: &str, code: Option<&str>) -> AppResult<Subject> {
        if name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        self.insert("subjects", &json!({ "name": name.trim(), "code": code }))
            .await
    }

    async fn create_course(&self, subject_id: &str, name: &str) -> AppResult<Course> {
        if name.trim().is_empty() {
            return Err(AppError::required("name"));
        }
        self.insert("courses", &json!({ "subject_id": subject_id, "name": name.trim() }))
            .await
    }

    async fn create_unit(&self, course_id: &str, title: &str, position: i32) -> AppResult<EduUnit> {
        if title.trim().is_empty() {
            return Err(AppError::required("title"));
        }
        self.insert(
            "edu_units",
            &json!({ "course_id": course_id, "title": title.trim(), "position": position }),
        )
        .await
    }

    async fn delete_unit(&self, unit_id: &str) -> AppResult<()> {
        self.delete("edu_units", &[eq_filter("id", unit_id)]).await
    }
}
