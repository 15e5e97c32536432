use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::*;

/// Each role lives in its own table with its own role-scoped identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "parent" => Ok(Role::Parent),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = students)]
pub struct Student {
    pub id: i32,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub semester: Option<i32>,
    pub enrollment_year: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub semester: Option<i32>,
    pub enrollment_year: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = faculty)]
pub struct Faculty {
    pub id: i32,
    pub faculty_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = faculty)]
pub struct NewFaculty {
    pub faculty_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = parents)]
pub struct Parent {
    pub id: i32,
    pub parent_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
    pub relationship: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = parents)]
pub struct NewParent {
    pub parent_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
    pub relationship: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
}

/// Response-safe view of a student row, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: i32,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub semester: Option<i32>,
    pub enrollment_year: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Student> for StudentProfile {
    fn from(row: Student) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            department: row.department,
            semester: row.semester,
            enrollment_year: row.enrollment_year,
            date_of_birth: row.date_of_birth,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyProfile {
    pub id: i32,
    pub faculty_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Faculty> for FacultyProfile {
    fn from(row: Faculty) -> Self {
        Self {
            id: row.id,
            faculty_id: row.faculty_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            department: row.department,
            designation: row.designation,
            joining_date: row.joining_date,
            specialization: row.specialization,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentProfile {
    pub id: i32,
    pub parent_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
    pub relationship: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Parent> for ParentProfile {
    fn from(row: Parent) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            student_id: row.student_id,
            relationship: row.relationship,
            occupation: row.occupation,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Any of the three sanitized account views, serialized without an outer tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountProfile {
    Student(StudentProfile),
    Faculty(FacultyProfile),
    Parent(ParentProfile),
}
