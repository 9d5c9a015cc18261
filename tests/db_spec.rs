use chrono::NaiveDate;
use questmate::db::{Database, StoreError};
use questmate::models::*;
use speculate2::speculate;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn create_test_user(db: &Database, name: &str) -> UserProgress {
    let user = UserProgress::new(name, "Default College", day(1));
    db.create_user(&user).expect("Failed to create user");
    user
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "users" {
        describe "create_user" {
            it "stores a new user with one shield" {
                create_test_user(&db, "ada");

                let found = db.get_user("ada").expect("Query failed").expect("User missing");
                assert_eq!(found.username, "ada");
                assert_eq!(found.experience_points, 0);
                assert_eq!(found.shield_count, 1);
                assert_eq!(found.last_login_date, day(1));
                assert!(found.current_skill.is_none());
            }

            it "rejects a duplicate username" {
                create_test_user(&db, "ada");

                let err = db
                    .create_user(&UserProgress::new("ada", "Elsewhere", day(2)))
                    .unwrap_err();
                assert!(matches!(err, StoreError::UserExists(name) if name == "ada"));
            }

            it "round-trips levels and completed tasks" {
                let mut user = UserProgress::new("grace", "Yale", day(3));
                user.current_skill = Some("Python".into());
                user.levels.insert("Python".into(), 3);
                user.levels.insert("HTML".into(), 2);
                user.completed_tasks.insert("Python".into(), vec![1, 2]);
                user.shield_paused_until = Some(day(10));
                user.paused_reason = Some("Exams".into());
                db.create_user(&user).expect("Failed to create");

                let found = db.get_user("grace").expect("Query failed").unwrap();
                assert_eq!(found, user);
            }
        }

        describe "get_user" {
            it "returns None for an unknown user" {
                assert!(db.get_user("nobody").expect("Query failed").is_none());
            }
        }

        describe "all_users" {
            it "returns every user ordered by username with their levels" {
                create_test_user(&db, "zed");
                create_test_user(&db, "amy");
                db.mutate_user("zed", |u| {
                    u.levels.insert("DSA".into(), 2);
                    Ok::<_, StoreError>(())
                })
                .unwrap();

                let users = db.all_users().expect("Query failed");
                let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
                assert_eq!(names, vec!["amy", "zed"]);
                assert_eq!(users[1].level_in("DSA"), 2);
                assert!(users[0].levels.is_empty());
            }
        }

        describe "mutate_user" {
            it "persists the changes made by the closure" {
                create_test_user(&db, "ada");

                let xp = db
                    .mutate_user("ada", |u| {
                        u.experience_points += 50;
                        u.current_skill = Some("Python".into());
                        u.levels.insert("Python".into(), 2);
                        u.completed_tasks.entry("Python".into()).or_default().push(1);
                        Ok::<_, StoreError>(u.experience_points)
                    })
                    .expect("Mutation failed");
                assert_eq!(xp, 50);

                let found = db.get_user("ada").unwrap().unwrap();
                assert_eq!(found.experience_points, 50);
                assert_eq!(found.current_position(), Some(("Python", 2)));
                assert_eq!(found.completed_tasks["Python"], vec![1]);
            }

            it "writes nothing when the closure fails" {
                create_test_user(&db, "ada");

                let result: Result<(), StoreError> = db.mutate_user("ada", |u| {
                    u.experience_points = 999;
                    u.levels.insert("Python".into(), 9);
                    Err(StoreError::UserNotFound("forced".into()))
                });
                assert!(result.is_err());

                let found = db.get_user("ada").unwrap().unwrap();
                assert_eq!(found.experience_points, 0);
                assert!(found.levels.is_empty());
            }

            it "fails with UserNotFound for an unknown user" {
                let result = db.mutate_user("ghost", |_| Ok::<_, StoreError>(()));
                assert!(matches!(result, Err(StoreError::UserNotFound(name)) if name == "ghost"));
            }

            it "keeps the username fixed" {
                create_test_user(&db, "ada");

                db.mutate_user("ada", |u| {
                    u.username = "eve".into();
                    Ok::<_, StoreError>(())
                })
                .unwrap();

                assert!(db.get_user("ada").unwrap().is_some());
                assert!(db.get_user("eve").unwrap().is_none());
            }

            it "serialises concurrent increments" {
                create_test_user(&db, "ada");

                let handles: Vec<_> = (0..8)
                    .map(|_| {
                        let db = db.clone();
                        std::thread::spawn(move || {
                            db.mutate_user("ada", |u| {
                                u.experience_points += 10;
                                Ok::<_, StoreError>(())
                            })
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }

                assert_eq!(db.get_user("ada").unwrap().unwrap().experience_points, 80);
            }
        }
    }

    describe "mentorship" {
        describe "create_mentorship_request" {
            it "creates a pending request with a default topic" {
                create_test_user(&db, "student");
                create_test_user(&db, "mentor");

                let request = db
                    .create_mentorship_request("student", "mentor", MentorshipRequestInput::default())
                    .expect("Failed to create request");

                assert_eq!(request.student, "student");
                assert_eq!(request.mentor, "mentor");
                assert_eq!(request.topic, "General help");
                assert_eq!(request.status, MentorshipStatus::Pending);
            }

            it "fails when the mentor does not exist" {
                create_test_user(&db, "student");

                let err = db
                    .create_mentorship_request("student", "ghost", MentorshipRequestInput::default())
                    .unwrap_err();
                assert!(matches!(err, StoreError::UserNotFound(name) if name == "ghost"));
            }
        }

        describe "get_mentorship_requests" {
            it "lists requests where the user is student or mentor" {
                create_test_user(&db, "a-user");
                create_test_user(&db, "b-user");
                create_test_user(&db, "c-user");

                db.create_mentorship_request("a-user", "b-user", MentorshipRequestInput {
                    skill: Some("Python".into()),
                    topic: Some("Loops".into()),
                })
                .unwrap();
                db.create_mentorship_request("c-user", "a-user", MentorshipRequestInput::default())
                    .unwrap();

                let for_a = db.get_mentorship_requests("a-user").expect("Query failed");
                assert_eq!(for_a.len(), 2);

                let for_b = db.get_mentorship_requests("b-user").expect("Query failed");
                assert_eq!(for_b.len(), 1);
                assert_eq!(for_b[0].topic, "Loops");
                assert_eq!(for_b[0].skill.as_deref(), Some("Python"));

                assert!(db.get_mentorship_requests("nobody").unwrap().is_empty());
            }
        }
    }
}
