//! In-memory port implementations.
//!
//! These back the handler tests and the no-database development mode. They
//! enforce the same uniqueness rules the SQL schema enforces, so handlers
//! observe identical outcomes against either adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageParams;
use uuid::Uuid;

use crate::domain::calendar::CalendarEvent;
use crate::domain::contact::ContactMessage;
use crate::domain::course::{Assignment, Certificate, Course};
use crate::domain::enrollment::{Enrollment, EnrollmentStatus, GuestEnrollment, Progress};
use crate::domain::internship::{Internship, InternshipSubmission, SubmissionStatus};
use crate::domain::services::{ServiceCategory, ServiceRequest, ServiceSubcategory};
use crate::domain::social::{ActivityType, Post, SocialActivity};
use crate::domain::token::{TokenFingerprint, TokenRecord};
use crate::domain::user::{EmailAddress, ProfileUpdate, User, UserId, UserSummary};

use super::{
    AdminUserUpdate, ApplyOutcome, AssignmentRepository, CalendarEventRepository,
    CertificateRepository, ConnectionRepository, ContactRepository, CourseListFilter,
    CourseRepository, EnrollmentListFilter, EnrollmentRepository, ImageNamespace, ImageStore,
    ImageStoreError, InternshipListFilter, InternshipRepository, PagedResult, RepositoryError,
    RequestListFilter, ServiceCatalogRepository, ServiceRequestRepository,
    SocialActivityRepository, TokenRepository, UserListFilter, UserRepository,
    validate_image_upload,
};

fn lock<T>(state: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    state
        .lock()
        .map_err(|_| RepositoryError::query("fixture state lock poisoned"))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn page_of<T>(items: Vec<T>, params: PageParams) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let window = items
        .into_iter()
        .skip(params.offset())
        .take(params.limit() as usize)
        .collect();
    (window, total)
}

/// In-memory [`UserRepository`].
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = lock(&self.users)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::duplicate("email"));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?
            .iter()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(display_name) = &update.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(headline) = &update.headline {
            user.headline = Some(headline.clone());
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.clone());
        }
        Ok(Some(user.clone()))
    }

    async fn set_avatar_path(
        &self,
        id: UserId,
        path: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.avatar_path = Some(path.to_owned());
        Ok(Some(user.clone()))
    }

    async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, RepositoryError> {
        Ok(lock(&self.users)?
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(User::summary)
            .collect())
    }

    async fn list(&self, filter: &UserListFilter, params: PageParams) -> PagedResult<User> {
        let users = lock(&self.users)?;
        let mut matched: Vec<User> = users
            .iter()
            .filter(|u| {
                filter
                    .account_type
                    .is_none_or(|wanted| u.account_type == wanted)
            })
            .filter(|u| {
                filter.search.as_deref().is_none_or(|needle| {
                    contains_ci(u.display_name.as_str(), needle)
                        || contains_ci(u.email.as_str(), needle)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(matched, params))
    }

    async fn admin_update(
        &self,
        id: UserId,
        update: &AdminUserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(display_name) = &update.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(account_type) = update.account_type {
            user.account_type = account_type;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(is_verified) = update.is_verified {
            user.is_verified = is_verified;
        }
        Ok(Some(user.clone()))
    }

    async fn deactivate(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.is_active = false;
        Ok(true)
    }
}

/// In-memory [`TokenRepository`].
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: Mutex<Vec<TokenRecord>>,
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, record: &TokenRecord) -> Result<(), RepositoryError> {
        lock(&self.tokens)?.push(record.clone());
        Ok(())
    }

    async fn find(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<TokenRecord>, RepositoryError> {
        Ok(lock(&self.tokens)?
            .iter()
            .find(|t| &t.fingerprint == fingerprint)
            .cloned())
    }

    async fn delete(&self, fingerprint: &TokenFingerprint) -> Result<bool, RepositoryError> {
        let mut tokens = lock(&self.tokens)?;
        let before = tokens.len();
        tokens.retain(|t| &t.fingerprint != fingerprint);
        Ok(tokens.len() < before)
    }
}

/// In-memory [`ConnectionRepository`]. Connections are stored one-directional
/// and written both ways on connect, mirroring the SQL adapter.
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    edges: Mutex<Vec<(UserId, UserId)>>,
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn connections_of(&self, user: UserId) -> Result<Vec<UserId>, RepositoryError> {
        Ok(lock(&self.edges)?
            .iter()
            .filter(|(from, _)| *from == user)
            .map(|(_, to)| *to)
            .collect())
    }

    async fn connect(&self, user: UserId, peer: UserId) -> Result<(), RepositoryError> {
        let mut edges = lock(&self.edges)?;
        if edges.contains(&(user, peer)) {
            return Err(RepositoryError::duplicate("connection"));
        }
        edges.push((user, peer));
        edges.push((peer, user));
        Ok(())
    }

    async fn disconnect(&self, user: UserId, peer: UserId) -> Result<bool, RepositoryError> {
        let mut edges = lock(&self.edges)?;
        let before = edges.len();
        edges.retain(|edge| *edge != (user, peer) && *edge != (peer, user));
        Ok(edges.len() < before)
    }
}

/// In-memory [`SocialActivityRepository`].
#[derive(Default)]
pub struct InMemorySocialActivityRepository {
    activities: Mutex<Vec<SocialActivity>>,
}

impl InMemorySocialActivityRepository {
    fn reaction_exists(
        activities: &[SocialActivity],
        target: Uuid,
        author: UserId,
        kind: ActivityType,
    ) -> bool {
        activities.iter().any(|a| {
            a.activity_type() == kind && a.target_id() == Some(target) && a.author_id() == author
        })
    }
}

#[async_trait]
impl SocialActivityRepository for InMemorySocialActivityRepository {
    async fn insert(&self, activity: &SocialActivity) -> Result<(), RepositoryError> {
        let mut activities = lock(&self.activities)?;
        match activity {
            SocialActivity::Like(like) => {
                if Self::reaction_exists(
                    &activities,
                    like.target_id,
                    like.author_id,
                    ActivityType::Like,
                ) {
                    return Err(RepositoryError::duplicate("like"));
                }
            }
            SocialActivity::Bookmark(bookmark) => {
                if Self::reaction_exists(
                    &activities,
                    bookmark.target_id,
                    bookmark.author_id,
                    ActivityType::Bookmark,
                ) {
                    return Err(RepositoryError::duplicate("bookmark"));
                }
            }
            SocialActivity::Post(_) | SocialActivity::Comment(_) => {}
        }
        activities.push(activity.clone());
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        Ok(lock(&self.activities)?.iter().find_map(|a| match a {
            SocialActivity::Post(post) if post.id == id => Some(post.clone()),
            _ => None,
        }))
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let activities = lock(&self.activities)?;
        let mut posts: Vec<Post> = activities
            .iter()
            .filter_map(|a| match a {
                SocialActivity::Post(post) => Some(post.clone()),
                _ => None,
            })
            .collect();
        // No backing index here; sort explicitly, newest first.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn activities_for_target(
        &self,
        target: Uuid,
    ) -> Result<Vec<SocialActivity>, RepositoryError> {
        Ok(lock(&self.activities)?
            .iter()
            .filter(|a| a.target_id() == Some(target))
            .cloned()
            .collect())
    }

    async fn delete_reaction(
        &self,
        target: Uuid,
        author: UserId,
        kind: ActivityType,
    ) -> Result<bool, RepositoryError> {
        let mut activities = lock(&self.activities)?;
        let before = activities.len();
        activities.retain(|a| {
            !(a.activity_type() == kind
                && a.target_id() == Some(target)
                && a.author_id() == author)
        });
        Ok(activities.len() < before)
    }

    async fn increment_share_count(&self, post: Uuid) -> Result<bool, RepositoryError> {
        let mut activities = lock(&self.activities)?;
        for activity in activities.iter_mut() {
            if let SocialActivity::Post(stored) = activity {
                if stored.id == post {
                    stored.share_count += 1;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn set_post_image(&self, post: Uuid, path: &str) -> Result<bool, RepositoryError> {
        let mut activities = lock(&self.activities)?;
        for activity in activities.iter_mut() {
            if let SocialActivity::Post(stored) = activity {
                if stored.id == post {
                    stored.image_path = Some(path.to_owned());
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn delete_post_cascade(&self, post: Uuid) -> Result<bool, RepositoryError> {
        let mut activities = lock(&self.activities)?;
        let existed = activities
            .iter()
            .any(|a| matches!(a, SocialActivity::Post(p) if p.id == post));
        if !existed {
            return Ok(false);
        }
        activities.retain(|a| a.id() != post && a.target_id() != Some(post));
        Ok(true)
    }
}

/// In-memory [`CourseRepository`].
#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: Mutex<Vec<Course>>,
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError> {
        lock(&self.courses)?.push(course.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Course>, RepositoryError> {
        Ok(lock(&self.courses)?.iter().find(|c| c.id == id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Course>, RepositoryError> {
        Ok(lock(&self.courses)?
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn list(&self, filter: &CourseListFilter, params: PageParams) -> PagedResult<Course> {
        let courses = lock(&self.courses)?;
        let matched: Vec<Course> = courses
            .iter()
            .filter(|c| {
                filter.search.as_deref().is_none_or(|needle| {
                    contains_ci(&c.title, needle)
                        || c.category
                            .as_deref()
                            .is_some_and(|cat| contains_ci(cat, needle))
                })
            })
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn update(&self, course: &Course) -> Result<bool, RepositoryError> {
        let mut courses = lock(&self.courses)?;
        let Some(stored) = courses.iter_mut().find(|c| c.id == course.id) else {
            return Ok(false);
        };
        *stored = course.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut courses = lock(&self.courses)?;
        let before = courses.len();
        courses.retain(|c| c.id != id);
        Ok(courses.len() < before)
    }
}

#[derive(Default)]
struct EnrollmentState {
    enrollments: Vec<Enrollment>,
    guests: Vec<GuestEnrollment>,
}

/// In-memory [`EnrollmentRepository`].
#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    state: Mutex<EnrollmentState>,
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state)?;
        if state
            .enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(RepositoryError::duplicate("enrollment"));
        }
        state.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(lock(&self.state)?
            .enrollments
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Enrollment>, RepositoryError> {
        let state = lock(&self.state)?;
        let mut matched: Vec<Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(matched)
    }

    async fn record_progress(
        &self,
        id: Uuid,
        progress: Progress,
        status: EnrollmentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state.enrollments.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        stored.progress = progress;
        stored.status = status;
        Ok(true)
    }

    async fn list(
        &self,
        filter: &EnrollmentListFilter,
        params: PageParams,
    ) -> PagedResult<Enrollment> {
        let state = lock(&self.state)?;
        let matched: Vec<Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| filter.user_id.is_none_or(|user| e.user_id == user))
            .filter(|e| filter.status.is_none_or(|status| e.status == status))
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn update(&self, enrollment: &Enrollment) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state.enrollments.iter_mut().find(|e| e.id == enrollment.id) else {
            return Ok(false);
        };
        *stored = enrollment.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let before = state.enrollments.len();
        state.enrollments.retain(|e| e.id != id);
        Ok(state.enrollments.len() < before)
    }

    async fn insert_guest(&self, guest: &GuestEnrollment) -> Result<(), RepositoryError> {
        lock(&self.state)?.guests.push(guest.clone());
        Ok(())
    }

    async fn guest_requests_for_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Vec<GuestEnrollment>, RepositoryError> {
        Ok(lock(&self.state)?
            .guests
            .iter()
            .filter(|g| &g.email == email)
            .cloned()
            .collect())
    }

    async fn consume_guest(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let before = state.guests.len();
        state.guests.retain(|g| g.id != id);
        Ok(state.guests.len() < before)
    }
}

/// In-memory [`CertificateRepository`].
#[derive(Default)]
pub struct InMemoryCertificateRepository {
    certificates: Mutex<Vec<Certificate>>,
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn insert(&self, certificate: &Certificate) -> Result<(), RepositoryError> {
        lock(&self.certificates)?.push(certificate.clone());
        Ok(())
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Certificate>, RepositoryError> {
        Ok(lock(&self.certificates)?
            .iter()
            .filter(|c| c.user_id == user)
            .cloned()
            .collect())
    }

    async fn list(&self, params: PageParams) -> PagedResult<Certificate> {
        let certificates = lock(&self.certificates)?;
        Ok(page_of(certificates.clone(), params))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut certificates = lock(&self.certificates)?;
        let before = certificates.len();
        certificates.retain(|c| c.id != id);
        Ok(certificates.len() < before)
    }
}

/// In-memory [`AssignmentRepository`].
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: Mutex<Vec<Assignment>>,
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn insert(&self, assignment: &Assignment) -> Result<(), RepositoryError> {
        lock(&self.assignments)?.push(assignment.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Assignment>, RepositoryError> {
        Ok(lock(&self.assignments)?
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list(
        &self,
        course_id: Option<Uuid>,
        params: PageParams,
    ) -> PagedResult<Assignment> {
        let assignments = lock(&self.assignments)?;
        let matched: Vec<Assignment> = assignments
            .iter()
            .filter(|a| course_id.is_none_or(|course| a.course_id == course))
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn update(&self, assignment: &Assignment) -> Result<bool, RepositoryError> {
        let mut assignments = lock(&self.assignments)?;
        let Some(stored) = assignments.iter_mut().find(|a| a.id == assignment.id) else {
            return Ok(false);
        };
        *stored = assignment.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut assignments = lock(&self.assignments)?;
        let before = assignments.len();
        assignments.retain(|a| a.id != id);
        Ok(assignments.len() < before)
    }
}

#[derive(Default)]
struct InternshipState {
    postings: Vec<Internship>,
    submissions: Vec<InternshipSubmission>,
}

/// In-memory [`InternshipRepository`].
///
/// `apply` holds the single state lock across the capacity check, decrement
/// and submission insert, giving the same atomicity as the SQL adapter's
/// conditional decrement.
#[derive(Default)]
pub struct InMemoryInternshipRepository {
    state: Mutex<InternshipState>,
}

#[async_trait]
impl InternshipRepository for InMemoryInternshipRepository {
    async fn insert(&self, internship: &Internship) -> Result<(), RepositoryError> {
        lock(&self.state)?.postings.push(internship.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Internship>, RepositoryError> {
        Ok(lock(&self.state)?
            .postings
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Internship>, RepositoryError> {
        Ok(lock(&self.state)?
            .postings
            .iter()
            .filter(|i| i.is_active)
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        filter: &InternshipListFilter,
        params: PageParams,
    ) -> PagedResult<Internship> {
        let state = lock(&self.state)?;
        let matched: Vec<Internship> = state
            .postings
            .iter()
            .filter(|i| filter.include_inactive || i.is_active)
            .filter(|i| {
                filter.search.as_deref().is_none_or(|needle| {
                    contains_ci(&i.title, needle) || contains_ci(&i.company, needle)
                })
            })
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn update(&self, internship: &Internship) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state.postings.iter_mut().find(|i| i.id == internship.id) else {
            return Ok(false);
        };
        *stored = internship.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let before = state.postings.len();
        state.postings.retain(|i| i.id != id);
        Ok(state.postings.len() < before)
    }

    async fn apply(
        &self,
        submission: &InternshipSubmission,
    ) -> Result<ApplyOutcome, RepositoryError> {
        let mut state = lock(&self.state)?;
        if state.submissions.iter().any(|s| {
            s.internship_id == submission.internship_id && s.user_id == submission.user_id
        }) {
            return Err(RepositoryError::duplicate("internship application"));
        }
        let Some(posting) = state
            .postings
            .iter_mut()
            .find(|i| i.id == submission.internship_id)
        else {
            return Err(RepositoryError::query("internship not found"));
        };
        if posting.spots_available <= 0 {
            return Ok(ApplyOutcome::NoSpotsAvailable);
        }
        posting.spots_available -= 1;
        state.submissions.push(submission.clone());
        Ok(ApplyOutcome::Accepted)
    }

    async fn submissions_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<InternshipSubmission>, RepositoryError> {
        let state = lock(&self.state)?;
        let mut matched: Vec<InternshipSubmission> = state
            .submissions
            .iter()
            .filter(|s| s.user_id == user)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(matched)
    }

    async fn set_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state.submissions.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        stored.status = status;
        Ok(true)
    }
}

#[derive(Default)]
struct CatalogState {
    categories: Vec<ServiceCategory>,
    subcategories: Vec<ServiceSubcategory>,
}

/// In-memory [`ServiceCatalogRepository`].
#[derive(Default)]
pub struct InMemoryServiceCatalogRepository {
    state: Mutex<CatalogState>,
}

#[async_trait]
impl ServiceCatalogRepository for InMemoryServiceCatalogRepository {
    async fn categories(&self) -> Result<Vec<ServiceCategory>, RepositoryError> {
        Ok(lock(&self.state)?.categories.clone())
    }

    async fn subcategories(
        &self,
        category: Option<Uuid>,
    ) -> Result<Vec<ServiceSubcategory>, RepositoryError> {
        Ok(lock(&self.state)?
            .subcategories
            .iter()
            .filter(|s| category.is_none_or(|wanted| s.category_id == wanted))
            .cloned()
            .collect())
    }

    async fn find_subcategory(
        &self,
        id: Uuid,
    ) -> Result<Option<ServiceSubcategory>, RepositoryError> {
        Ok(lock(&self.state)?
            .subcategories
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert_category(&self, category: &ServiceCategory) -> Result<(), RepositoryError> {
        lock(&self.state)?.categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &ServiceCategory) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state.categories.iter_mut().find(|c| c.id == category.id) else {
            return Ok(false);
        };
        *stored = category.clone();
        Ok(true)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        if state.categories.len() == before {
            return Ok(false);
        }
        state.subcategories.retain(|s| s.category_id != id);
        Ok(true)
    }

    async fn insert_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<(), RepositoryError> {
        lock(&self.state)?.subcategories.push(subcategory.clone());
        Ok(())
    }

    async fn update_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let Some(stored) = state
            .subcategories
            .iter_mut()
            .find(|s| s.id == subcategory.id)
        else {
            return Ok(false);
        };
        *stored = subcategory.clone();
        Ok(true)
    }

    async fn delete_subcategory(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state)?;
        let before = state.subcategories.len();
        state.subcategories.retain(|s| s.id != id);
        Ok(state.subcategories.len() < before)
    }
}

/// In-memory [`ServiceRequestRepository`].
#[derive(Default)]
pub struct InMemoryServiceRequestRepository {
    requests: Mutex<Vec<ServiceRequest>>,
}

#[async_trait]
impl ServiceRequestRepository for InMemoryServiceRequestRepository {
    async fn insert(&self, request: &ServiceRequest) -> Result<(), RepositoryError> {
        lock(&self.requests)?.push(request.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ServiceRequest>, RepositoryError> {
        Ok(lock(&self.requests)?.iter().find(|r| r.id == id).cloned())
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let requests = lock(&self.requests)?;
        let mut matched: Vec<ServiceRequest> = requests
            .iter()
            .filter(|r| r.user_id == Some(user))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn list(
        &self,
        filter: &RequestListFilter,
        params: PageParams,
    ) -> PagedResult<ServiceRequest> {
        let requests = lock(&self.requests)?;
        let matched: Vec<ServiceRequest> = requests
            .iter()
            .filter(|r| filter.status.is_none_or(|status| r.status == status))
            .filter(|r| {
                filter.search.as_deref().is_none_or(|needle| {
                    contains_ci(&r.contact_name, needle)
                        || contains_ci(r.contact_email.as_str(), needle)
                })
            })
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn update(&self, request: &ServiceRequest) -> Result<bool, RepositoryError> {
        let mut requests = lock(&self.requests)?;
        let Some(stored) = requests.iter_mut().find(|r| r.id == request.id) else {
            return Ok(false);
        };
        *stored = request.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut requests = lock(&self.requests)?;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        Ok(requests.len() < before)
    }
}

/// In-memory [`ContactRepository`].
#[derive(Default)]
pub struct InMemoryContactRepository {
    messages: Mutex<Vec<ContactMessage>>,
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn insert(&self, message: &ContactMessage) -> Result<(), RepositoryError> {
        lock(&self.messages)?.push(message.clone());
        Ok(())
    }

    async fn list(
        &self,
        search: Option<&str>,
        params: PageParams,
    ) -> PagedResult<ContactMessage> {
        let messages = lock(&self.messages)?;
        let matched: Vec<ContactMessage> = messages
            .iter()
            .filter(|m| {
                search.is_none_or(|needle| {
                    contains_ci(&m.name, needle) || contains_ci(m.email.as_str(), needle)
                })
            })
            .cloned()
            .collect();
        Ok(page_of(matched, params))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut messages = lock(&self.messages)?;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() < before)
    }
}

/// In-memory [`CalendarEventRepository`].
#[derive(Default)]
pub struct InMemoryCalendarEventRepository {
    events: Mutex<Vec<CalendarEvent>>,
}

#[async_trait]
impl CalendarEventRepository for InMemoryCalendarEventRepository {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), RepositoryError> {
        lock(&self.events)?.push(event.clone());
        Ok(())
    }

    async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let events = lock(&self.events)?;
        let mut matched: Vec<CalendarEvent> = events
            .iter()
            .filter(|e| e.ends_at.unwrap_or(e.starts_at) >= now)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(matched)
    }

    async fn list(&self, params: PageParams) -> PagedResult<CalendarEvent> {
        let events = lock(&self.events)?;
        Ok(page_of(events.clone(), params))
    }

    async fn update(&self, event: &CalendarEvent) -> Result<bool, RepositoryError> {
        let mut events = lock(&self.events)?;
        let Some(stored) = events.iter_mut().find(|e| e.id == event.id) else {
            return Ok(false);
        };
        *stored = event.clone();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut events = lock(&self.events)?;
        let before = events.len();
        events.retain(|e| e.id != id);
        Ok(events.len() < before)
    }
}

/// In-memory [`ImageStore`] keeping uploads in a map.
#[derive(Default)]
pub struct InMemoryImageStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    /// Number of stored files, for test assertions.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(
        &self,
        namespace: ImageNamespace,
        filename_hint: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageStoreError> {
        let ext = validate_image_upload(filename_hint, bytes.len())?;
        let path = format!("{}/{}.{ext}", namespace.as_str(), Uuid::new_v4());
        let mut files = self.files.lock().map_err(|_| ImageStoreError::Io {
            message: "fixture state lock poisoned".into(),
        })?;
        files.insert(path.clone(), bytes);
        Ok(path)
    }

    async fn delete(&self, path: &str) -> Result<(), ImageStoreError> {
        let mut files = self.files.lock().map_err(|_| ImageStoreError::Io {
            message: "fixture state lock poisoned".into(),
        })?;
        files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! The fixtures enforce the same uniqueness and atomicity rules as SQL.
    use chrono::Utc;
    use rstest::rstest;

    use crate::domain::social::{Like, PostContent, Visibility};

    use super::*;

    fn post(author: UserId) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: author,
            content: PostContent::new("hello").expect("valid content"),
            image_path: None,
            visibility: Visibility::Public,
            is_achievement: false,
            share_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_likes_are_rejected() {
        let repo = InMemorySocialActivityRepository::default();
        let author = UserId::random();
        let stored = post(author);
        repo.insert(&SocialActivity::Post(stored.clone()))
            .await
            .expect("post stored");

        let like = Like {
            id: Uuid::new_v4(),
            author_id: author,
            target_id: stored.id,
            created_at: Utc::now(),
        };
        repo.insert(&SocialActivity::Like(like.clone()))
            .await
            .expect("first like stored");
        let err = repo
            .insert(&SocialActivity::Like(Like {
                id: Uuid::new_v4(),
                ..like
            }))
            .await
            .expect_err("second like must fail");
        assert_eq!(err, RepositoryError::duplicate("like"));
    }

    #[tokio::test]
    async fn deleting_a_post_cascades_to_targeting_activities() {
        let repo = InMemorySocialActivityRepository::default();
        let author = UserId::random();
        let stored = post(author);
        repo.insert(&SocialActivity::Post(stored.clone()))
            .await
            .expect("post stored");
        repo.insert(&SocialActivity::Like(Like {
            id: Uuid::new_v4(),
            author_id: UserId::random(),
            target_id: stored.id,
            created_at: Utc::now(),
        }))
        .await
        .expect("like stored");

        assert!(repo
            .delete_post_cascade(stored.id)
            .await
            .expect("cascade runs"));
        assert!(repo
            .activities_for_target(stored.id)
            .await
            .expect("query runs")
            .is_empty());
        assert!(repo.find_post(stored.id).await.expect("query runs").is_none());
    }

    #[tokio::test]
    async fn applications_stop_when_spots_run_out() {
        let repo = InMemoryInternshipRepository::default();
        let posting = Internship::new("Intern", "Acme", "desc", 1, Utc::now()).expect("valid");
        repo.insert(&posting).await.expect("posting stored");

        let first =
            InternshipSubmission::new(posting.id, UserId::random(), None, Utc::now());
        assert_eq!(
            repo.apply(&first).await.expect("apply runs"),
            ApplyOutcome::Accepted
        );

        let second =
            InternshipSubmission::new(posting.id, UserId::random(), None, Utc::now());
        assert_eq!(
            repo.apply(&second).await.expect("apply runs"),
            ApplyOutcome::NoSpotsAvailable
        );
    }

    #[tokio::test]
    async fn duplicate_applications_do_not_consume_spots() {
        let repo = InMemoryInternshipRepository::default();
        let posting = Internship::new("Intern", "Acme", "desc", 2, Utc::now()).expect("valid");
        repo.insert(&posting).await.expect("posting stored");

        let user = UserId::random();
        let first = InternshipSubmission::new(posting.id, user, None, Utc::now());
        assert_eq!(
            repo.apply(&first).await.expect("apply runs"),
            ApplyOutcome::Accepted
        );
        let again = InternshipSubmission::new(posting.id, user, None, Utc::now());
        let err = repo.apply(&again).await.expect_err("duplicate must fail");
        assert_eq!(err, RepositoryError::duplicate("internship application"));

        let stored = repo
            .find(posting.id)
            .await
            .expect("query runs")
            .expect("posting exists");
        assert_eq!(stored.spots_available, 1);
    }

    #[rstest]
    #[case("avatar.png", 10, true)]
    #[case("avatar.PNG", 10, true)]
    #[case("avatar.txt", 10, false)]
    #[case("no-extension", 10, false)]
    fn image_policy_checks_extension(
        #[case] name: &str,
        #[case] len: usize,
        #[case] accepted: bool,
    ) {
        assert_eq!(validate_image_upload(name, len).is_ok(), accepted);
    }

    #[tokio::test]
    async fn image_store_round_trips_paths() {
        let store = InMemoryImageStore::default();
        let path = store
            .save(ImageNamespace::Avatars, "me.png", vec![1, 2, 3])
            .await
            .expect("save succeeds");
        assert!(path.starts_with("avatars/"));
        assert_eq!(store.stored_count(), 1);
        store.delete(&path).await.expect("delete succeeds");
        assert_eq!(store.stored_count(), 0);
    }
}
