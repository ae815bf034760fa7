use serde::Serialize;

/// Response envelope every endpoint uses: `{success, data?, message?, pagination?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            pagination: None,
        }
    }

    pub fn ok_paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(pagination),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serialization() {
        let json = serde_json::to_string(&ApiResponse::ok(vec![1, 2, 3])).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":[1,2,3]"));
        assert!(!json.contains("message"));
        assert!(!json.contains("pagination"));
    }

    #[test]
    fn error_envelope_serialization() {
        let json = serde_json::to_string(&ApiResponse::<()>::error("Meal plan not found")).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("Meal plan not found"));
    }

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        let p = Pagination::new(1, 10, 30);
        assert_eq!(p.total_pages, 3);
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
    }
}
