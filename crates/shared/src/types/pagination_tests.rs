use super::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 20);
}

#[test]
fn test_page_request_offset() {
    let request = PageRequest {
        page: 1,
        per_page: 20,
    };
    assert_eq!(request.offset(), 0);

    let request = PageRequest {
        page: 3,
        per_page: 20,
    };
    assert_eq!(request.offset(), 40);
}

#[test]
fn test_page_request_normalized_clamps() {
    let request = PageRequest {
        page: 0,
        per_page: 10_000,
    }
    .normalized();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, MAX_PER_PAGE);
}

#[test]
fn test_page_response_total_pages() {
    let response = PageResponse::new(vec![1, 2, 3], 1, 10, 21);
    assert_eq!(response.meta.total_pages, 3);

    let empty: PageResponse<i32> = PageResponse::new(vec![], 1, 10, 0);
    assert_eq!(empty.meta.total_pages, 1);
}

#[test]
fn test_page_response_from_vec() {
    let items: Vec<u32> = (1..=25).collect();
    let page = PageResponse::from_vec(
        items,
        PageRequest {
            page: 3,
            per_page: 10,
        },
    );
    assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
    assert_eq!(page.meta.total, 25);
    assert_eq!(page.meta.total_pages, 3);
}
