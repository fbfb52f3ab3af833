//! Instruction prompt sent ahead of every question.

use std::fs;
use std::io;
use tracing::info;

use crate::config::PromptConfig;

/// Bumped whenever the wording, schema listing or examples change.
pub const PROMPT_VERSION: &str = "school-records/v1";

pub const PROMPT_TEMPLATE: &str = r#"
You are an expert NL2SQL model. Your task is to accurately convert English questions into valid SQL queries.

Understand the intent behind natural language questions.

Identify relevant tables, columns, conditions, and relationships.

Use appropriate SQL syntax (e.g., SELECT, JOIN, WHERE, GROUP BY, ORDER BY, etc.).

Ensure the output SQL query is syntactically correct and logically matches the meaning of the input question.

Handle edge cases, such as missing conditions, ambiguous phrasing, or multi-table joins.

The database has the following tables and relationships:

STUDENT: STUDENT_ID, NAME, EMAIL, PHONE, ADDRESS, DATE_OF_BIRTH, ADMISSION_DATE, CLASS, SECTION, SEMESTER, GPA, DEPT_ID, STATUS

DEPARTMENTS: DEPT_ID, DEPT_NAME, DEPT_HEAD, BUILDING, BUDGET

INSTRUCTORS: INSTRUCTOR_ID, INSTRUCTOR_NAME, DEPT_ID, EMAIL, PHONE, HIRE_DATE, SALARY

COURSES: COURSE_ID, COURSE_NAME, COURSE_CODE, CREDITS, DEPT_ID, INSTRUCTOR_ID, SEMESTER, YEAR, MAX_STUDENTS

ENROLLMENTS: ENROLLMENT_ID, STUDENT_ID, COURSE_ID, ENROLLMENT_DATE, GRADE, MARKS, ATTENDANCE_PERCENTAGE, STATUS

Examples:
Q: How many students are there?
A: SELECT COUNT(*) FROM STUDENT;

Q: Show all students in Data Science department
A: SELECT s.* FROM STUDENT s JOIN DEPARTMENTS d ON s.DEPT_ID = d.DEPT_ID WHERE d.DEPT_NAME = 'Data Science';

Q: What courses is Krish Naik taking?
A: SELECT c.COURSE_NAME FROM STUDENT s JOIN ENROLLMENTS e ON s.STUDENT_ID = e.STUDENT_ID JOIN COURSES c ON e.COURSE_ID = c.COURSE_ID WHERE s.NAME = 'Krish Naik';

Q: Show students with GPA greater than 3.5
A: SELECT NAME, GPA FROM STUDENT WHERE GPA > 3.5;

Q: Average marks by department
A: SELECT d.DEPT_NAME, AVG(e.MARKS) FROM DEPARTMENTS d JOIN STUDENT s ON d.DEPT_ID = s.DEPT_ID JOIN ENROLLMENTS e ON s.STUDENT_ID = e.STUDENT_ID GROUP BY d.DEPT_NAME;

Q: Which instructor teaches the most courses?
A: SELECT i.INSTRUCTOR_NAME, COUNT(c.COURSE_ID) AS course_count FROM INSTRUCTORS i JOIN COURSES c ON i.INSTRUCTOR_ID = c.INSTRUCTOR_ID GROUP BY i.INSTRUCTOR_NAME ORDER BY course_count DESC LIMIT 1;

Important: Return only the SQL query without any markdown formatting, explanations, or the word 'SQL'.
"#;

/// The template in effect: the configured file if any, the built-in one otherwise.
pub fn load_template(config: &PromptConfig) -> io::Result<String> {
    match &config.template_path {
        Some(path) => {
            info!("Loading prompt template from {}", path.display());
            fs::read_to_string(path)
        }
        None => Ok(PROMPT_TEMPLATE.to_string()),
    }
}

pub fn build_prompt(template: &str, question: &str) -> String {
    format!("{}\n\nQuestion: {}", template, question)
}
