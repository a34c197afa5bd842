use account_service::{AccountsService, RepositoryType};
use chrono::NaiveDate;
use common::error::Error;
use common::model::{AccountDto, AccountField};
use common::query::{build_predicate, FilterCriteria, PageRequest, Sorter};
use tokio::test;

use dotenv::dotenv;

// PostgreSQL integration tests for account service
// These tests require a running PostgreSQL database
// Run with: cargo test --test account_postgres_tests -- --ignored

async fn create_test_service() -> AccountsService {
    dotenv().ok();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    AccountsService::with_repository(RepositoryType::Postgres(Some(database_url)))
        .await
        .expect("Failed to create accounts service with PostgreSQL repository")
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_account_lifecycle() {
    let service = create_test_service().await;
    let name = unique("lifecycle");

    let created = service
        .create_or_update_account(AccountDto::new(&name, "SAVINGS", NaiveDate::from_ymd_opt(2020, 1, 15)))
        .await
        .unwrap();
    let fetched = service.get_account_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = service
        .create_or_update_account(AccountDto::from(created.clone()))
        .await
        .unwrap();
    assert_eq!(updated, created);

    service.delete_account(created.id).await.unwrap();
    assert!(matches!(
        service.delete_account(created.id).await,
        Err(Error::AccountNotFound(_))
    ));
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_filter_sort_and_page() {
    let service = create_test_service().await;
    let tag = unique("paging");

    for (suffix, day) in [("a", 3), ("b", 1), ("c", 2)] {
        service
            .create_or_update_account(AccountDto::new(
                format!("{}-{}", tag, suffix),
                "CHECKING",
                NaiveDate::from_ymd_opt(2022, 5, day),
            ))
            .await
            .unwrap();
    }

    let params: FilterCriteria = [
        ("name", tag.as_str()),
        ("sort", "openDate,desc"),
        ("page", "0"),
        ("size", "2"),
    ]
    .into_iter()
    .collect();

    let predicate = build_predicate::<AccountField>(&params);
    let request = Sorter::sort(&params, PageRequest::from_params(&params).unwrap()).unwrap();
    let page = service.find_all(&predicate, &request).await.unwrap();

    assert_eq!(page.total_count, 3);
    let names: Vec<String> = page.items.into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec![format!("{}-a", tag), format!("{}-c", tag)]);
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_name_sort_matches_in_memory() {
    let postgres = create_test_service().await;
    let memory = AccountsService::new();
    let tag = unique("collate");

    for suffix in ["b", "B", "a"] {
        for service in [&postgres, &memory] {
            service
                .create_or_update_account(AccountDto::new(format!("{}-{}", tag, suffix), "SAVINGS", None))
                .await
                .unwrap();
        }
    }

    let params: FilterCriteria = [("name", tag.as_str()), ("sort", "name,asc")].into_iter().collect();
    let predicate = build_predicate::<AccountField>(&params);
    let request = Sorter::sort(&params, PageRequest::from_params(&params).unwrap()).unwrap();

    let mut orders = Vec::new();
    for service in [&postgres, &memory] {
        let page = service.find_all(&predicate, &request).await.unwrap();
        orders.push(page.items.into_iter().map(|a| a.name).collect::<Vec<_>>());
    }

    let expected: Vec<String> = ["B", "a", "b"].iter().map(|s| format!("{}-{}", tag, s)).collect();
    assert_eq!(orders[0], expected);
    assert_eq!(orders[1], expected);
}
