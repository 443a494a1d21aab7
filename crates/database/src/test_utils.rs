use crate::{
    db::create_connection,
    entities::{courses, enrollments, lessons, progress_records},
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use models::{
    course::Difficulty,
    lesson::ContentType,
    role::{Principal, Role},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use uuid::Uuid;

pub const TEACHER: &str = "teacher-1";

/// Fresh in-memory database with every migration applied.
///
/// A single pooled connection keeps the in-memory database alive and shared.
pub async fn setup() -> DatabaseConnection {
    let db = create_connection("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

pub fn teacher() -> Principal {
    Principal::new(TEACHER, Role::Teacher)
}

pub fn student(id: &str) -> Principal {
    Principal::new(id, Role::Student)
}

/// A course with lessons inserted straight through the entities
pub struct Fixture {
    pub course: courses::Model,
    pub lessons: Vec<lessons::Model>,
}

impl Fixture {
    pub async fn published_course(db: &DatabaseConnection, lesson_count: i32) -> Self {
        Self::course(db, lesson_count, true).await
    }

    pub async fn course(db: &DatabaseConnection, lesson_count: i32, published: bool) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let course = courses::ActiveModel {
            id: Set(id),
            title: Set("Fixture course".to_owned()),
            slug: Set(format!("fixture-{id}")),
            description: Set("A course used by tests".to_owned()),
            teacher_id: Set(TEACHER.to_owned()),
            category_id: Set(None),
            thumbnail: Set(None),
            difficulty: Set(Difficulty::Beginner),
            price_cents: Set(0),
            duration_hours: Set(1),
            is_published: Set(published),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to insert course");

        let mut fixture = Self {
            course,
            lessons: Vec::new(),
        };
        for order in 0..lesson_count {
            let lesson = fixture.insert_lesson(db, order).await;
            fixture.lessons.push(lesson);
        }
        fixture
    }

    pub async fn insert_lesson(&self, db: &DatabaseConnection, order: i32) -> lessons::Model {
        let now = Utc::now();
        lessons::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(self.course.id),
            title: Set(format!("Lesson {order}")),
            description: Set(String::new()),
            content_type: Set(ContentType::Text),
            content: Set("Lorem ipsum".to_owned()),
            video_url: Set(String::new()),
            file_ref: Set(None),
            order: Set(order),
            duration_minutes: Set(10),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to insert lesson")
    }

    pub async fn enroll(&self, db: &DatabaseConnection, student_id: &str) -> enrollments::Model {
        enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(student_id.to_owned()),
            course_id: Set(self.course.id),
            enrolled_at: Set(Utc::now()),
            completed: Set(false),
            completed_at: Set(None),
            progress_percentage: Set(0),
        }
        .insert(db)
        .await
        .expect("Failed to insert enrollment")
    }

    pub async fn insert_progress(
        &self,
        db: &DatabaseConnection,
        enrollment: &enrollments::Model,
        lesson_index: usize,
        completed: bool,
    ) -> progress_records::Model {
        progress_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            enrollment_id: Set(enrollment.id),
            lesson_id: Set(self.lessons[lesson_index].id),
            completed: Set(completed),
            completed_at: Set(completed.then(Utc::now)),
        }
        .insert(db)
        .await
        .expect("Failed to insert progress")
    }
}
