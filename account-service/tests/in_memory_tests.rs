use account_service::{AccountRepository, InMemoryAccountRepository};
use chrono::NaiveDate;
use common::model::{AccountField, NewAccount};
use common::query::{build_predicate, Direction, FilterCriteria, PageRequest, Predicate, Sort};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_account(name: &str, account_type: &str, open_date: NaiveDate) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        account_type: account_type.to_string(),
        open_date,
    }
}

async fn seeded() -> InMemoryAccountRepository {
    let repo = InMemoryAccountRepository::new();
    repo.insert(new_account("Alice Savings", "SAVINGS", date(2020, 1, 15))).await.unwrap();
    repo.insert(new_account("Bob Checking", "CHECKING", date(2021, 6, 1))).await.unwrap();
    repo.insert(new_account("Carol Savings", "SAVINGS", date(2019, 3, 9))).await.unwrap();
    repo.insert(new_account("Dave Brokerage", "BROKERAGE", date(2021, 6, 1))).await.unwrap();
    repo
}

#[tokio::test]
async fn test_insert_assigns_increasing_ids() {
    let repo = InMemoryAccountRepository::new();
    assert!(repo.accounts.is_empty());

    let first = repo.insert(new_account("A", "SAVINGS", date(2020, 1, 1))).await.unwrap();
    let second = repo.insert(new_account("B", "SAVINGS", date(2020, 1, 1))).await.unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(repo.accounts.len(), 2);
}

#[tokio::test]
async fn test_find_all_is_ordered_by_id() {
    let repo = seeded().await;
    let ids: Vec<i32> = repo.find_all().await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_update_and_delete_missing_id() {
    let repo = seeded().await;
    let mut ghost = repo.find_by_id(1).await.unwrap().unwrap();
    ghost.id = 99;

    assert!(repo.update(ghost).await.unwrap().is_none());
    assert!(!repo.delete(99).await.unwrap());
    assert!(repo.delete(1).await.unwrap());
    assert!(repo.find_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_page_filters_and_counts() {
    let repo = seeded().await;
    let criteria: FilterCriteria = [("type", "eq:SAVINGS")].into_iter().collect();
    let predicate = build_predicate::<AccountField>(&criteria);

    let page = repo
        .find_page(&predicate, &PageRequest::new(0, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Alice Savings");
    assert_eq!(page.total_pages(), 2);
}

#[tokio::test]
async fn test_find_page_beyond_last_page_is_empty() {
    let repo = seeded().await;
    let page = repo
        .find_page(&Predicate::all(), &PageRequest::new(5, 2).unwrap())
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 4);
    assert_eq!(page.page_number, 5);
}

#[tokio::test]
async fn test_find_page_sorts_with_id_tie_break() {
    let repo = seeded().await;
    let request = PageRequest::new(0, 10)
        .unwrap()
        .with_sort(Sort::new(AccountField::OpenDate, Direction::Descending));

    let page = repo.find_page(&Predicate::all(), &request).await.unwrap();
    let ids: Vec<i32> = page.items.iter().map(|a| a.id).collect();

    // Bob and Dave share an open date; the lower id comes first
    assert_eq!(ids, vec![2, 4, 1, 3]);
}

#[tokio::test]
async fn test_date_range_filter() {
    let repo = seeded().await;
    let criteria: FilterCriteria = [("openDate", "gte:2020-01-15")].into_iter().collect();
    let predicate = build_predicate::<AccountField>(&criteria);

    let page = repo
        .find_page(&predicate, &PageRequest::default())
        .await
        .unwrap();

    let ids: Vec<i32> = page.items.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);
}
