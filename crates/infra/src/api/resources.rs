//! Typed wrappers over the backend's resource endpoints
//!
//! Every call goes through [`ApiClient::send`], so all of them share the
//! credential injection and refresh behaviour. Payloads are generic: pass
//! `serde_json::Value` or a caller-defined `serde` type.

use std::fmt::Display;

use coursehub_domain::ListParams;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::{ApiRequest, MultipartPart};

/// User id accepted by [`Courses::complete`] for the signed-in user
pub const CURRENT_USER: &str = "current";

/// `/courses/`
#[derive(Debug, Clone, Copy)]
pub struct Courses<'a> {
    client: &'a ApiClient,
}

impl<'a> Courses<'a> {
    pub async fn list<T: DeserializeOwned>(&self, params: &ListParams) -> Result<T, ApiError> {
        self.client.request_json(ApiRequest::get("/courses/").queries(params.to_pairs())).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("/courses/{id}/")).await
    }

    pub async fn create<B, T>(&self, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.post("/courses/", data).await
    }

    pub async fn update<B, T>(&self, id: impl Display, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.patch(&format!("/courses/{id}/"), data).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
        discard(self.client, ApiRequest::delete(format!("/courses/{id}/"))).await
    }

    pub async fn restore<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "restore").await
    }

    pub async fn enroll<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "enroll").await
    }

    pub async fn unenroll<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "unenroll").await
    }

    /// Mark a course complete
    ///
    /// [`CURRENT_USER`] completes it for the signed-in user; any other id
    /// completes it on that user's behalf.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidInput` if `user_id` is empty
    pub async fn complete<T: DeserializeOwned>(
        &self,
        id: impl Display,
        user_id: &str,
    ) -> Result<T, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("user_id is required".into()));
        }

        if user_id == CURRENT_USER {
            return self.action(id, "complete").await;
        }

        self.client.post(&format!("/courses/{id}/admin_complete/"), &json!({ "user_id": user_id })).await
    }

    pub async fn enrollment<T: DeserializeOwned>(
        &self,
        course_id: impl Display,
        user_id: impl Display,
    ) -> Result<T, ApiError> {
        self.client.get(&format!("/courses/{course_id}/enrollments/{user_id}/")).await
    }

    /// Modules of one course
    pub fn modules(&self, course_id: impl Display) -> Modules<'a> {
        Modules { client: self.client, base: format!("/courses/{course_id}/modules/") }
    }

    /// Lessons of one module
    pub fn lessons(&self, course_id: impl Display, module_id: impl Display) -> Lessons<'a> {
        Lessons {
            client: self.client,
            base: format!("/courses/{course_id}/modules/{module_id}/lessons/"),
        }
    }

    /// Assessments attached to one course
    pub fn assessments(&self, course_id: impl Display) -> CourseAssessments<'a> {
        CourseAssessments { client: self.client, base: format!("/courses/{course_id}/assessments/") }
    }

    async fn action<T: DeserializeOwned>(&self, id: impl Display, action: &str) -> Result<T, ApiError> {
        self.client.request_json(ApiRequest::post(format!("/courses/{id}/{action}/"))).await
    }
}

/// Nested collection with soft delete: list, CRUD and restore
macro_rules! nested_collection {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name<'a> {
            client: &'a ApiClient,
            base: String,
        }

        impl $name<'_> {
            pub async fn list<T: DeserializeOwned>(
                &self,
                show_deleted: Option<bool>,
            ) -> Result<T, ApiError> {
                let params = ListParams { show_deleted, ..ListParams::default() };
                self.client
                    .request_json(ApiRequest::get(self.base.clone()).queries(params.to_pairs()))
                    .await
            }

            pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
                self.client.get(&format!("{}{id}/", self.base)).await
            }

            pub async fn create<B, T>(&self, data: &B) -> Result<T, ApiError>
            where
                B: Serialize + ?Sized,
                T: DeserializeOwned,
            {
                self.client.post(&self.base, data).await
            }

            pub async fn update<B, T>(&self, id: impl Display, data: &B) -> Result<T, ApiError>
            where
                B: Serialize + ?Sized,
                T: DeserializeOwned,
            {
                self.client.patch(&format!("{}{id}/", self.base), data).await
            }

            pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
                discard(self.client, ApiRequest::delete(format!("{}{id}/", self.base))).await
            }

            pub async fn restore<T: DeserializeOwned>(
                &self,
                id: impl Display,
            ) -> Result<T, ApiError> {
                self.client
                    .request_json(ApiRequest::post(format!("{}{id}/restore/", self.base)))
                    .await
            }
        }
    };
}

nested_collection! {
    /// `/courses/{course}/modules/`
    Modules
}

nested_collection! {
    /// `/courses/{course}/modules/{module}/lessons/`
    Lessons
}

/// `/courses/{course}/assessments/`
#[derive(Debug, Clone)]
pub struct CourseAssessments<'a> {
    client: &'a ApiClient,
    base: String,
}

impl CourseAssessments<'_> {
    pub async fn list<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.client.get(&self.base).await
    }

    pub async fn create<B, T>(&self, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.post(&self.base, data).await
    }

    pub async fn update<B, T>(&self, id: impl Display, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.put(&format!("{}{id}/", self.base), data).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
        discard(self.client, ApiRequest::delete(format!("{}{id}/", self.base))).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("{}{id}/", self.base)).await
    }

    /// Submissions for one assessment
    pub async fn submissions<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("{}{id}/submissions/", self.base)).await
    }

    /// Upload a submission as `multipart/form-data`
    pub async fn submit<T: DeserializeOwned>(
        &self,
        id: impl Display,
        parts: Vec<MultipartPart>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post(format!("{}{id}/submit/", self.base)).multipart(parts);
        self.client.request_json(request).await
    }

    pub async fn delete_submission(
        &self,
        id: impl Display,
        submission_id: impl Display,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::delete(format!("{}{id}/delete_submission/", self.base))
            .query("submission_id", submission_id.to_string());
        discard(self.client, request).await
    }
}

/// `/assessments/`
#[derive(Debug, Clone, Copy)]
pub struct Assessments<'a> {
    client: &'a ApiClient,
}

impl Assessments<'_> {
    /// Create an assessment attached to any assessable object
    pub async fn create<B, T>(&self, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.post("/assessments/", data).await
    }
}

/// `/enrollments/`
#[derive(Debug, Clone, Copy)]
pub struct Enrollments<'a> {
    client: &'a ApiClient,
}

impl Enrollments<'_> {
    pub async fn list<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.client.get("/enrollments/").await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("/enrollments/{id}/")).await
    }

    pub async fn create<B, T>(&self, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.post("/enrollments/", data).await
    }

    pub async fn update<B, T>(&self, id: impl Display, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.put(&format!("/enrollments/{id}/"), data).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
        discard(self.client, ApiRequest::delete(format!("/enrollments/{id}/"))).await
    }
}

/// `/access_requests/`
#[derive(Debug, Clone, Copy)]
pub struct AccessRequests<'a> {
    client: &'a ApiClient,
}

impl AccessRequests<'_> {
    /// List access requests; `query` is a raw query string without `?`
    pub async fn list<T: DeserializeOwned>(&self, query: Option<&str>) -> Result<T, ApiError> {
        self.client.get(&with_raw_query("/access_requests/", query)).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("/access_requests/{id}/")).await
    }

    pub async fn approve<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "approve").await
    }

    pub async fn reject<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "reject").await
    }

    pub async fn revoke<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "revoke").await
    }

    pub async fn restore<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.action(id, "restore").await
    }

    async fn action<T: DeserializeOwned>(&self, id: impl Display, action: &str) -> Result<T, ApiError> {
        self.client.request_json(ApiRequest::post(format!("/access_requests/{id}/{action}/"))).await
    }
}

/// `/users/`
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl Users<'_> {
    /// List users; `query` is a raw query string without `?`
    pub async fn list<T: DeserializeOwned>(&self, query: Option<&str>) -> Result<T, ApiError> {
        self.client.get(&with_raw_query("/users/", query)).await
    }

    /// Fetch a user; `"me"` is the signed-in user
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<T, ApiError> {
        self.client.get(&format!("/users/{id}/")).await
    }

    pub async fn update<B, T>(&self, id: &str, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.put(&format!("/users/{id}/"), data).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ApiError> {
        discard(self.client, ApiRequest::delete(format!("/users/{id}/"))).await
    }

    pub async fn revoke<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.request_json(ApiRequest::post(format!("/users/{id}/revoke/"))).await
    }

    pub async fn restore<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.request_json(ApiRequest::post(format!("/users/{id}/restore/"))).await
    }
}

/// `/organizations/`
#[derive(Debug, Clone, Copy)]
pub struct Organizations<'a> {
    client: &'a ApiClient,
}

impl Organizations<'_> {
    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, ApiError> {
        self.client.get(&format!("/organizations/{id}/")).await
    }

    pub async fn update<B, T>(&self, id: impl Display, data: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.patch(&format!("/organizations/{id}/"), data).await
    }
}

/// `/stats/`
#[derive(Debug, Clone, Copy)]
pub struct Stats<'a> {
    client: &'a ApiClient,
}

impl Stats<'_> {
    pub async fn get<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.client.get("/stats/").await
    }
}

impl ApiClient {
    pub fn courses(&self) -> Courses<'_> {
        Courses { client: self }
    }

    pub fn assessments(&self) -> Assessments<'_> {
        Assessments { client: self }
    }

    pub fn enrollments(&self) -> Enrollments<'_> {
        Enrollments { client: self }
    }

    pub fn access_requests(&self) -> AccessRequests<'_> {
        AccessRequests { client: self }
    }

    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    pub fn organizations(&self) -> Organizations<'_> {
        Organizations { client: self }
    }

    pub fn stats(&self) -> Stats<'_> {
        Stats { client: self }
    }
}

/// Send a request whose response body is not needed
async fn discard(client: &ApiClient, request: ApiRequest) -> Result<(), ApiError> {
    client.send(request).await.map(drop)
}

fn with_raw_query(path: &str, query: Option<&str>) -> String {
    match query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty()) {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use coursehub_common::testing::{MockCredentialStore, RecordingSessionListener};
    use serde_json::Value;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn setup() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        let client = ApiClient::builder()
            .base_url(server.uri())
            .credential_store(Arc::new(MockCredentialStore::with_credentials("T1", "R1")))
            .session_listener(Arc::new(RecordingSessionListener::new()))
            .build()
            .unwrap();
        (server, client)
    }

    #[test]
    fn raw_query_is_appended() {
        assert_eq!(with_raw_query("/users/", Some("role=admin")), "/users/?role=admin");
        assert_eq!(with_raw_query("/users/", Some("?role=admin")), "/users/?role=admin");
        assert_eq!(with_raw_query("/users/", Some("")), "/users/");
        assert_eq!(with_raw_query("/users/", None), "/users/");
    }

    #[tokio::test]
    async fn course_list_sends_params() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/courses/"))
            .and(query_param("page", "2"))
            .and(query_param("search", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1, "next": null, "previous": null, "results": [{"id": 1}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = ListParams { page: Some(2), search: Some("rust".into()), ..Default::default() };
        let page: coursehub_domain::Paginated<Value> = client.courses().list(&params).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0]["id"], 1);
    }

    #[tokio::test]
    async fn complete_routes_by_user() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/courses/3/complete/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/courses/3/admin_complete/"))
            .and(body_json(json!({"user_id": "42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
            .expect(1)
            .mount(&server)
            .await;

        let _: Value = client.courses().complete(3, CURRENT_USER).await.unwrap();
        let _: Value = client.courses().complete(3, "42").await.unwrap();

        let err = client.courses().complete::<Value>(3, "").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn nested_lessons_use_full_path() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/courses/1/modules/2/lessons/"))
            .and(query_param("show_deleted", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/courses/1/modules/2/lessons/5/restore/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let lessons = client.courses().lessons(1, 2);
        let listed: Vec<Value> = lessons.list(Some(true)).await.unwrap();
        assert!(listed.is_empty());
        let restored: Value = lessons.restore(5).await.unwrap();
        assert_eq!(restored["id"], 5);
    }

    #[tokio::test]
    async fn submission_is_multipart_and_delete_uses_query() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/courses/1/assessments/9/submit/"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/courses/1/assessments/9/delete_submission/"))
            .and(query_param("submission_id", "77"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let assessments = client.courses().assessments(1);
        let parts = vec![MultipartPart::file("file", "essay.txt", b"hello".to_vec())];
        let created: Value = assessments.submit(9, parts).await.unwrap();
        assert_eq!(created["id"], 77);
        assessments.delete_submission(9, 77).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn users_me_and_access_request_actions() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.c"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/access_requests/4/approve/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/access_requests/"))
            .and(query_param("status", "pending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0, "next": null, "previous": null, "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let me: Value = client.users().get("me").await.unwrap();
        assert_eq!(me["email"], "a@b.c");
        let approved: Value = client.access_requests().approve(4).await.unwrap();
        assert_eq!(approved["status"], "approved");
        let pending: Value = client.access_requests().list(Some("status=pending")).await.unwrap();
        assert_eq!(pending["count"], 0);
    }
}
