//! Creates the school-records tables and fills them with sample rows.

use duckdb::{params, Connection};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tracing::info;

const DROP_TABLES: &str = "
DROP TABLE IF EXISTS ENROLLMENTS;
DROP TABLE IF EXISTS COURSES;
DROP TABLE IF EXISTS STUDENT;
DROP TABLE IF EXISTS INSTRUCTORS;
DROP TABLE IF EXISTS DEPARTMENTS;
";

const CREATE_TABLES: &str = "
CREATE TABLE DEPARTMENTS (
    DEPT_ID INTEGER PRIMARY KEY,
    DEPT_NAME VARCHAR(50) NOT NULL,
    DEPT_HEAD VARCHAR(50),
    BUILDING VARCHAR(30),
    BUDGET DECIMAL(10,2)
);

CREATE TABLE INSTRUCTORS (
    INSTRUCTOR_ID INTEGER PRIMARY KEY,
    INSTRUCTOR_NAME VARCHAR(50) NOT NULL,
    DEPT_ID INTEGER,
    EMAIL VARCHAR(100),
    PHONE VARCHAR(15),
    HIRE_DATE DATE,
    SALARY DECIMAL(10,2),
    FOREIGN KEY (DEPT_ID) REFERENCES DEPARTMENTS(DEPT_ID)
);

CREATE TABLE COURSES (
    COURSE_ID INTEGER PRIMARY KEY,
    COURSE_NAME VARCHAR(100) NOT NULL,
    COURSE_CODE VARCHAR(10) UNIQUE,
    CREDITS INTEGER,
    DEPT_ID INTEGER,
    INSTRUCTOR_ID INTEGER,
    SEMESTER VARCHAR(20),
    YEAR INTEGER,
    MAX_STUDENTS INTEGER,
    FOREIGN KEY (DEPT_ID) REFERENCES DEPARTMENTS(DEPT_ID),
    FOREIGN KEY (INSTRUCTOR_ID) REFERENCES INSTRUCTORS(INSTRUCTOR_ID)
);

CREATE TABLE STUDENT (
    STUDENT_ID INTEGER PRIMARY KEY,
    NAME VARCHAR(50) NOT NULL,
    EMAIL VARCHAR(100),
    PHONE VARCHAR(15),
    ADDRESS VARCHAR(200),
    DATE_OF_BIRTH DATE,
    ADMISSION_DATE DATE,
    CLASS VARCHAR(50),
    SECTION VARCHAR(10),
    SEMESTER INTEGER,
    GPA DECIMAL(3,2),
    DEPT_ID INTEGER,
    STATUS VARCHAR(20) DEFAULT 'Active',
    FOREIGN KEY (DEPT_ID) REFERENCES DEPARTMENTS(DEPT_ID)
);

CREATE TABLE ENROLLMENTS (
    ENROLLMENT_ID INTEGER PRIMARY KEY,
    STUDENT_ID INTEGER,
    COURSE_ID INTEGER,
    ENROLLMENT_DATE DATE,
    GRADE VARCHAR(2),
    MARKS INTEGER,
    ATTENDANCE_PERCENTAGE DECIMAL(5,2),
    STATUS VARCHAR(20) DEFAULT 'Enrolled',
    FOREIGN KEY (STUDENT_ID) REFERENCES STUDENT(STUDENT_ID),
    FOREIGN KEY (COURSE_ID) REFERENCES COURSES(COURSE_ID)
);
";

// (name, head, building, budget)
const DEPARTMENTS: &[(&str, &str, &str, f64)] = &[
    ("Computer Science", "Dr. Sarah Johnson", "Tech Building", 500000.00),
    ("Data Science", "Dr. Michael Chen", "Analytics Center", 450000.00),
    ("DevOps Engineering", "Dr. James Wilson", "Engineering Hall", 400000.00),
    ("Cybersecurity", "Dr. Emily Davis", "Security Center", 350000.00),
    ("Artificial Intelligence", "Dr. Robert Kim", "AI Research Lab", 600000.00),
    ("Web Development", "Dr. Lisa Brown", "Innovation Hub", 300000.00),
];

// (name, dept, email, phone, hire date, salary)
const INSTRUCTORS: &[(&str, i32, &str, &str, &str, f64)] = &[
    ("Dr. Sarah Johnson", 1, "sarah.johnson@university.edu", "+1-555-0101", "2020-01-15", 95000.00),
    ("Dr. Michael Chen", 2, "michael.chen@university.edu", "+1-555-0102", "2019-08-20", 98000.00),
    ("Dr. James Wilson", 3, "james.wilson@university.edu", "+1-555-0103", "2021-02-10", 92000.00),
    ("Dr. Emily Davis", 4, "emily.davis@university.edu", "+1-555-0104", "2020-09-05", 89000.00),
    ("Dr. Robert Kim", 5, "robert.kim@university.edu", "+1-555-0105", "2018-01-30", 105000.00),
    ("Dr. Lisa Brown", 6, "lisa.brown@university.edu", "+1-555-0106", "2021-07-15", 87000.00),
    ("Prof. John Smith", 1, "john.smith@university.edu", "+1-555-0107", "2019-03-12", 82000.00),
    ("Prof. Maria Garcia", 2, "maria.garcia@university.edu", "+1-555-0108", "2020-11-22", 85000.00),
    ("Prof. David Lee", 3, "david.lee@university.edu", "+1-555-0109", "2021-05-18", 80000.00),
    ("Prof. Anna Rodriguez", 4, "anna.rodriguez@university.edu", "+1-555-0110", "2019-12-03", 88000.00),
];

// (name, code, credits, dept, instructor, semester, year, max students)
const COURSES: &[(&str, &str, i32, i32, i32, &str, i32, i32)] = &[
    ("Python Programming", "CS101", 3, 1, 1, "Fall", 2024, 30),
    ("Machine Learning Fundamentals", "DS201", 4, 2, 2, "Spring", 2024, 25),
    ("Database Systems", "CS301", 3, 1, 7, "Fall", 2024, 35),
    ("Docker and Containerization", "DO101", 3, 3, 3, "Spring", 2024, 20),
    ("Network Security", "CY201", 4, 4, 4, "Fall", 2024, 22),
    ("Deep Learning", "AI301", 4, 5, 5, "Spring", 2024, 18),
    ("Web Development with React", "WD201", 3, 6, 6, "Fall", 2024, 28),
    ("Data Structures and Algorithms", "CS201", 4, 1, 1, "Spring", 2024, 32),
    ("Statistical Analysis", "DS101", 3, 2, 8, "Fall", 2024, 26),
    ("Kubernetes Administration", "DO201", 3, 3, 9, "Spring", 2024, 15),
    ("Ethical Hacking", "CY301", 4, 4, 10, "Fall", 2024, 20),
    ("Natural Language Processing", "AI201", 4, 5, 5, "Spring", 2024, 16),
    ("Full Stack Development", "WD301", 4, 6, 6, "Fall", 2024, 24),
    ("Cloud Computing", "CS401", 3, 1, 7, "Spring", 2024, 30),
    ("Big Data Analytics", "DS301", 4, 2, 2, "Fall", 2024, 20),
];

struct Student {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
    born: &'static str,
    class: &'static str,
    section: &'static str,
    semester: i32,
    gpa: f64,
    dept: i32,
}

const ADMISSION_DATE: &str = "2023-08-20";
const ENROLLMENT_DATE: &str = "2024-01-15";

const STUDENTS: &[Student] = &[
    Student { name: "Krish Naik", email: "krish.naik@student.edu", phone: "+1-555-1001", address: "123 Main St, City, State", born: "2001-05-15", class: "Data Science", section: "A", semester: 3, gpa: 3.8, dept: 2 },
    Student { name: "Sudhanshu Kumar", email: "sudhanshu@student.edu", phone: "+1-555-1002", address: "456 Oak Ave, City, State", born: "2000-12-10", class: "Data Science", section: "B", semester: 3, gpa: 3.9, dept: 2 },
    Student { name: "Darius Thompson", email: "darius.t@student.edu", phone: "+1-555-1003", address: "789 Pine Rd, City, State", born: "2001-03-22", class: "Data Science", section: "A", semester: 3, gpa: 3.6, dept: 2 },
    Student { name: "Vikash Patel", email: "vikash.p@student.edu", phone: "+1-555-1004", address: "321 Elm St, City, State", born: "2002-07-08", class: "DevOps Engineering", section: "A", semester: 2, gpa: 2.8, dept: 3 },
    Student { name: "Dipesh Sharma", email: "dipesh.s@student.edu", phone: "+1-555-1005", address: "654 Maple Ave, City, State", born: "2001-11-30", class: "DevOps Engineering", section: "A", semester: 2, gpa: 2.1, dept: 3 },
    Student { name: "Alexandra Chen", email: "alex.chen@student.edu", phone: "+1-555-1006", address: "987 Cedar Ln, City, State", born: "2001-09-14", class: "Computer Science", section: "B", semester: 4, gpa: 3.7, dept: 1 },
    Student { name: "Mohammed Ali", email: "mohammed.ali@student.edu", phone: "+1-555-1007", address: "147 Birch St, City, State", born: "2000-04-25", class: "Cybersecurity", section: "A", semester: 3, gpa: 3.5, dept: 4 },
    Student { name: "Sarah Williams", email: "sarah.w@student.edu", phone: "+1-555-1008", address: "258 Spruce Ave, City, State", born: "2001-08-12", class: "Artificial Intelligence", section: "C", semester: 4, gpa: 3.9, dept: 5 },
    Student { name: "Carlos Rodriguez", email: "carlos.r@student.edu", phone: "+1-555-1009", address: "369 Willow Rd, City, State", born: "2002-01-18", class: "Web Development", section: "B", semester: 2, gpa: 3.3, dept: 6 },
    Student { name: "Jennifer Lee", email: "jennifer.l@student.edu", phone: "+1-555-1010", address: "741 Aspen St, City, State", born: "2001-06-07", class: "Data Science", section: "A", semester: 3, gpa: 3.8, dept: 2 },
    Student { name: "Ryan Murphy", email: "ryan.m@student.edu", phone: "+1-555-1011", address: "852 Poplar Ave, City, State", born: "2000-10-29", class: "Computer Science", section: "A", semester: 4, gpa: 3.6, dept: 1 },
    Student { name: "Lisa Zhang", email: "lisa.z@student.edu", phone: "+1-555-1012", address: "963 Hickory Ln, City, State", born: "2001-12-03", class: "Cybersecurity", section: "B", semester: 3, gpa: 3.4, dept: 4 },
    Student { name: "David Johnson", email: "david.j@student.edu", phone: "+1-555-1013", address: "159 Sycamore St, City, State", born: "2002-02-14", class: "DevOps Engineering", section: "C", semester: 2, gpa: 2.9, dept: 3 },
    Student { name: "Amy Taylor", email: "amy.t@student.edu", phone: "+1-555-1014", address: "357 Magnolia Ave, City, State", born: "2001-07-21", class: "Artificial Intelligence", section: "A", semester: 4, gpa: 3.7, dept: 5 },
    Student { name: "Kevin Brown", email: "kevin.b@student.edu", phone: "+1-555-1015", address: "753 Dogwood Rd, City, State", born: "2000-11-16", class: "Web Development", section: "A", semester: 2, gpa: 3.2, dept: 6 },
];

#[derive(Debug)]
pub struct SeedError(duckdb::Error);

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seeding failed: {}", self.0)
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl From<duckdb::Error> for SeedError {
    fn from(e: duckdb::Error) -> Self {
        SeedError(e)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// Fixed seed for reproducible enrollments; random when absent
    pub rng_seed: Option<u64>,
}

/// Rows written per table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub departments: usize,
    pub instructors: usize,
    pub courses: usize,
    pub students: usize,
    pub enrollments: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Enrollment {
    student_id: i32,
    course_id: i32,
    grade: &'static str,
    marks: i32,
    attendance: f64,
    status: &'static str,
}

fn letter_grade(marks: i32) -> &'static str {
    match marks {
        90.. => "A",
        80..=89 => "B",
        70..=79 => "C",
        60..=69 => "D",
        _ => "F",
    }
}

/// Each student takes 3 to 5 distinct courses.
fn generate_enrollments(rng: &mut StdRng) -> Vec<Enrollment> {
    let course_ids: Vec<i32> = (1..=COURSES.len() as i32).collect();
    let mut enrollments = Vec::new();

    for student_id in 1..=STUDENTS.len() as i32 {
        let count = rng.gen_range(3..=5);
        let picked: Vec<i32> = course_ids.choose_multiple(rng, count).copied().collect();

        for course_id in picked {
            let marks = rng.gen_range(35..=100);
            let attendance = (rng.gen_range(65.0..=98.0_f64) * 100.0).round() / 100.0;
            let status = if rng.gen_bool(0.9) { "Completed" } else { "Enrolled" };
            enrollments.push(Enrollment {
                student_id,
                course_id,
                grade: letter_grade(marks),
                marks,
                attendance,
                status,
            });
        }
    }

    enrollments
}

/// Drops and recreates the five tables at `database_path`, then fills them.
pub fn seed_database(
    database_path: impl AsRef<Path>,
    options: &SeedOptions,
) -> Result<SeedReport, SeedError> {
    let path = database_path.as_ref();
    info!("Seeding school-records database at {}", path.display());

    let mut rng = match options.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let enrollments = generate_enrollments(&mut rng);

    let mut conn = Connection::open(path)?;
    conn.execute_batch(DROP_TABLES)?;
    conn.execute_batch(CREATE_TABLES)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO DEPARTMENTS (DEPT_ID, DEPT_NAME, DEPT_HEAD, BUILDING, BUDGET) VALUES (?, ?, ?, ?, ?)",
        )?;
        for (id, (name, head, building, budget)) in (1..).zip(DEPARTMENTS) {
            stmt.execute(params![id, name, head, building, budget])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO INSTRUCTORS (INSTRUCTOR_ID, INSTRUCTOR_NAME, DEPT_ID, EMAIL, PHONE, HIRE_DATE, SALARY) \
             VALUES (?, ?, ?, ?, ?, CAST(? AS DATE), ?)",
        )?;
        for (id, (name, dept, email, phone, hired, salary)) in (1..).zip(INSTRUCTORS) {
            stmt.execute(params![id, name, dept, email, phone, hired, salary])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO COURSES (COURSE_ID, COURSE_NAME, COURSE_CODE, CREDITS, DEPT_ID, INSTRUCTOR_ID, SEMESTER, YEAR, MAX_STUDENTS) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (id, (name, code, credits, dept, instructor, semester, year, max)) in (1..).zip(COURSES) {
            stmt.execute(params![id, name, code, credits, dept, instructor, semester, year, max])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO STUDENT (STUDENT_ID, NAME, EMAIL, PHONE, ADDRESS, DATE_OF_BIRTH, ADMISSION_DATE, CLASS, SECTION, SEMESTER, GPA, DEPT_ID, STATUS) \
             VALUES (?, ?, ?, ?, ?, CAST(? AS DATE), CAST(? AS DATE), ?, ?, ?, ?, ?, 'Active')",
        )?;
        for (id, s) in (1..).zip(STUDENTS) {
            stmt.execute(params![
                id, s.name, s.email, s.phone, s.address, s.born, ADMISSION_DATE, s.class, s.section,
                s.semester, s.gpa, s.dept
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO ENROLLMENTS (ENROLLMENT_ID, STUDENT_ID, COURSE_ID, ENROLLMENT_DATE, GRADE, MARKS, ATTENDANCE_PERCENTAGE, STATUS) \
             VALUES (?, ?, ?, CAST(? AS DATE), ?, ?, ?, ?)",
        )?;
        for (id, e) in (1..).zip(&enrollments) {
            stmt.execute(params![
                id, e.student_id, e.course_id, ENROLLMENT_DATE, e.grade, e.marks, e.attendance, e.status
            ])?;
        }
    }
    tx.commit()?;

    let report = SeedReport {
        departments: DEPARTMENTS.len(),
        instructors: INSTRUCTORS.len(),
        courses: COURSES.len(),
        students: STUDENTS.len(),
        enrollments: enrollments.len(),
    };
    info!("Seeded database: {:?}", report);
    Ok(report)
}
