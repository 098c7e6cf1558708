use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{BudgetItemKind, Engine, EngineError, NewBudget};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A classification system with one parent and two leaves, and a budget
/// using it.
struct Fixture {
    government: Uuid,
    system: Uuid,
    budget: Uuid,
    parent: Uuid,
    left: Uuid,
    right: Uuid,
}

async fn fixture(engine: &Engine) -> Fixture {
    let government = engine.new_government("Tokyo").await.unwrap();
    let system = engine.new_classification_system("Functions").await.unwrap();
    let parent = engine
        .new_classification(system, "Health", Some("07"), None)
        .await
        .unwrap();
    let left = engine
        .new_classification(system, "Hospitals", Some("07.3"), Some(parent))
        .await
        .unwrap();
    let right = engine
        .new_classification(system, "Public health", Some("07.4"), Some(parent))
        .await
        .unwrap();
    let budget = new_budget(engine, government, system, "General account", 2024).await;
    Fixture {
        government,
        system,
        budget,
        parent,
        left,
        right,
    }
}

async fn new_budget(
    engine: &Engine,
    government: Uuid,
    system: Uuid,
    name: &str,
    year: i32,
) -> Uuid {
    engine
        .new_budget(NewBudget {
            name,
            year,
            subtitle: "initial",
            classification_system_id: system,
            government_id: government,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn single_leaf_value_aggregates_to_parent() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine.new_atomic_item(f.budget, f.left, 120.5).await.unwrap();

    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 120.5);
    assert_eq!(engine.value_of(f.budget, f.left).await.unwrap(), 120.5);
    assert_eq!(engine.value_of(f.budget, f.right).await.unwrap(), 0.0);
}

#[tokio::test]
async fn sibling_leaves_are_summed() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine.new_atomic_item(f.budget, f.left, 100.0).await.unwrap();
    engine.new_atomic_item(f.budget, f.right, 250.5).await.unwrap();

    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 350.5);
}

#[tokio::test]
async fn item_on_inner_node_takes_precedence() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine.new_atomic_item(f.budget, f.left, 100.0).await.unwrap();
    engine.new_atomic_item(f.budget, f.parent, 42.0).await.unwrap();

    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 42.0);
}

#[tokio::test]
async fn aggregation_spans_several_levels() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let deep = engine
        .new_classification(f.system, "Clinics", None, Some(f.left))
        .await
        .unwrap();

    engine.new_atomic_item(f.budget, deep, 8.0).await.unwrap();
    engine.new_atomic_item(f.budget, f.right, 2.0).await.unwrap();

    assert_eq!(engine.value_of(f.budget, f.left).await.unwrap(), 8.0);
    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 10.0);
}

#[tokio::test]
async fn empty_budget_resolves_to_zero() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 0.0);
}

#[tokio::test]
async fn mapped_item_sums_values_of_the_other_budget() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    // Budget Y uses another system.
    let other_system = engine.new_classification_system("Economic").await.unwrap();
    let c1 = engine
        .new_classification(other_system, "Salaries", None, None)
        .await
        .unwrap();
    let c2 = engine
        .new_classification(other_system, "Purchases", None, None)
        .await
        .unwrap();
    let c2a = engine
        .new_classification(other_system, "Medicines", None, Some(c2))
        .await
        .unwrap();
    let y = new_budget(&engine, f.government, other_system, "By nature", 2024).await;
    engine.new_atomic_item(y, c1, 30.0).await.unwrap();
    engine.new_atomic_item(y, c2a, 12.5).await.unwrap();

    let item_id = engine
        .new_mapped_item(f.budget, f.left, y, &[c1, c2])
        .await
        .unwrap();

    let expected = engine.value_of(y, c1).await.unwrap() + engine.value_of(y, c2).await.unwrap();
    assert_eq!(expected, 42.5);
    assert_eq!(engine.value_of(f.budget, f.left).await.unwrap(), expected);

    let item = engine.budget_item(f.budget, f.left).await.unwrap();
    assert_eq!(item.id, item_id);
    match &item.kind {
        BudgetItemKind::Mapped {
            mapped_budget_id,
            mapped_classification_ids,
        } => {
            assert_eq!(*mapped_budget_id, y);
            assert_eq!(sorted(mapped_classification_ids.clone()), sorted(vec![c1, c2]));
        }
        other => panic!("expected a mapped item, got {other:?}"),
    }
    assert_eq!(engine.item_value(&item).await.unwrap(), expected);

    // The mapped value feeds the aggregation of the containing budget.
    engine.new_atomic_item(f.budget, f.right, 7.5).await.unwrap();
    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 50.0);
}

#[tokio::test]
async fn mapping_a_node_and_its_ancestor_is_not_a_cycle() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let source = new_budget(&engine, f.government, f.system, "Source", 2023).await;
    engine.new_atomic_item(source, f.left, 5.0).await.unwrap();

    // `left` is reached twice: directly and through `parent`.
    engine
        .new_mapped_item(f.budget, f.right, source, &[f.left, f.parent])
        .await
        .unwrap();

    assert_eq!(engine.value_of(f.budget, f.right).await.unwrap(), 10.0);
}

#[tokio::test]
async fn duplicated_mapped_classifications_count_once() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let source = new_budget(&engine, f.government, f.system, "Source", 2023).await;
    engine.new_atomic_item(source, f.left, 5.0).await.unwrap();

    engine
        .new_mapped_item(f.budget, f.right, source, &[f.left, f.left])
        .await
        .unwrap();

    assert_eq!(engine.value_of(f.budget, f.right).await.unwrap(), 5.0);
}

#[tokio::test]
async fn classification_of_another_system_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let other_system = engine.new_classification_system("Economic").await.unwrap();
    let foreign = engine
        .new_classification(other_system, "Salaries", None, None)
        .await
        .unwrap();

    assert!(matches!(
        engine.value_of(f.budget, foreign).await.unwrap_err(),
        EngineError::MismatchedClassificationSystem(_)
    ));
    assert!(matches!(
        engine
            .new_atomic_item(f.budget, foreign, 1.0)
            .await
            .unwrap_err(),
        EngineError::MismatchedClassificationSystem(_)
    ));

    // Mapped classifications must belong to the mapped budget's system.
    let source = new_budget(&engine, f.government, f.system, "Source", 2023).await;
    assert!(matches!(
        engine
            .new_mapped_item(f.budget, f.left, source, &[foreign])
            .await
            .unwrap_err(),
        EngineError::MismatchedClassificationSystem(_)
    ));
    assert!(matches!(
        engine.budget_item(f.budget, f.left).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn one_item_per_budget_and_classification() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine.new_atomic_item(f.budget, f.left, 1.0).await.unwrap();
    let err = engine
        .new_atomic_item(f.budget, f.left, 2.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.value_of(f.budget, f.left).await.unwrap(), 1.0);
}

#[tokio::test]
async fn missing_item_is_not_found_but_resolves() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    assert_eq!(
        engine.budget_item(f.budget, f.right).await.unwrap_err(),
        EngineError::NotFound(format!(
            "budget item for classification {} in budget {}",
            f.right, f.budget
        ))
    );
    assert_eq!(engine.value_of(f.budget, f.right).await.unwrap(), 0.0);

    let missing = Uuid::new_v4();
    assert_eq!(
        engine.value_of(missing, f.right).await.unwrap_err(),
        EngineError::NotFound(format!("budget {missing}"))
    );
}

#[tokio::test]
async fn cross_budget_mapping_cycle_is_detected() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let other_system = engine.new_classification_system("Economic").await.unwrap();
    let c1 = engine
        .new_classification(other_system, "Salaries", None, None)
        .await
        .unwrap();
    let y = new_budget(&engine, f.government, other_system, "By nature", 2024).await;

    engine
        .new_mapped_item(f.budget, f.left, y, &[c1])
        .await
        .unwrap();
    engine
        .new_mapped_item(y, c1, f.budget, &[f.left])
        .await
        .unwrap();

    assert!(matches!(
        engine.value_of(f.budget, f.parent).await.unwrap_err(),
        EngineError::CycleDetected(_)
    ));
    let item = engine.budget_item(y, c1).await.unwrap();
    assert!(matches!(
        engine.item_value(&item).await.unwrap_err(),
        EngineError::CycleDetected(_)
    ));
}

#[tokio::test]
async fn mapping_onto_itself_is_detected() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine
        .new_mapped_item(f.budget, f.left, f.budget, &[f.parent])
        .await
        .unwrap();

    assert_eq!(
        engine.value_of(f.budget, f.left).await.unwrap_err(),
        EngineError::CycleDetected(format!(
            "value of classification {} in budget {} depends on itself",
            f.left, f.budget
        ))
    );
}

#[tokio::test]
async fn atomic_amount_can_be_replaced() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    engine.new_atomic_item(f.budget, f.left, 1.0).await.unwrap();

    engine.set_item_amount(f.budget, f.left, 9.5).await.unwrap();
    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 9.5);

    let source = new_budget(&engine, f.government, f.system, "Source", 2023).await;
    engine
        .new_mapped_item(f.budget, f.right, source, &[f.left])
        .await
        .unwrap();
    assert!(matches!(
        engine
            .set_item_amount(f.budget, f.right, 3.0)
            .await
            .unwrap_err(),
        EngineError::UnsupportedVariant(_)
    ));
}

#[tokio::test]
async fn stored_unknown_variant_is_unsupported() {
    let (engine, db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let backend = db.get_database_backend();
    let now = Utc::now();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO budget_items (id, budget_id, classification_id, kind, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().into(),
            f.budget.into(),
            f.left.into(),
            "formula".into(),
            now.into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();

    assert!(matches!(
        engine.value_of(f.budget, f.parent).await.unwrap_err(),
        EngineError::UnsupportedVariant(_)
    ));
}

#[tokio::test]
async fn deleting_items_and_budgets_cascades() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let source = new_budget(&engine, f.government, f.system, "Source", 2023).await;
    engine.new_atomic_item(source, f.left, 4.0).await.unwrap();
    engine.new_atomic_item(f.budget, f.left, 1.0).await.unwrap();
    engine
        .new_mapped_item(f.budget, f.right, source, &[f.left])
        .await
        .unwrap();
    assert_eq!(engine.budget_items(f.budget).await.unwrap().len(), 2);

    engine.delete_budget_item(f.budget, f.left).await.unwrap();
    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 4.0);

    // The mapped item goes away with the budget it maps onto.
    engine.delete_budget(source).await.unwrap();
    assert!(engine.budget_items(f.budget).await.unwrap().is_empty());
    assert_eq!(engine.value_of(f.budget, f.parent).await.unwrap(), 0.0);

    // Classifications take their items with them.
    engine.new_atomic_item(f.budget, f.right, 3.0).await.unwrap();
    engine.delete_classification(f.right).await.unwrap();
    assert!(engine.budget_items(f.budget).await.unwrap().is_empty());
}

#[tokio::test]
async fn budgets_belong_to_a_government() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let older = new_budget(&engine, f.government, f.system, "General account", 2020).await;

    let budgets = engine.budgets(f.government).await.unwrap();
    assert_eq!(
        budgets.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![older, f.budget]
    );

    let budget = engine.budget(f.budget).await.unwrap();
    assert_eq!(budget.year, 2024);
    assert_eq!(budget.classification_system_id, f.system);
    assert_eq!(budget.subtitle, "initial");

    engine
        .update_budget(f.budget, "Supplementary", " revised ")
        .await
        .unwrap();
    let budget = engine.budget(f.budget).await.unwrap();
    assert_eq!(budget.name, "Supplementary");
    assert_eq!(budget.subtitle, "revised");
    assert!(budget.updated_at >= budget.created_at);

    engine.delete_government(f.government).await.unwrap();
    assert!(matches!(
        engine.budget(f.budget).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn budget_needs_existing_government_and_system() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let missing = Uuid::new_v4();

    let err = engine
        .new_budget(NewBudget {
            name: "Ghost",
            year: 2024,
            subtitle: "",
            classification_system_id: f.system,
            government_id: missing,
        })
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(format!("government {missing}")));

    let err = engine
        .new_budget(NewBudget {
            name: "Ghost",
            year: 2024,
            subtitle: "",
            classification_system_id: missing,
            government_id: f.government,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotFound(format!("classification system {missing}"))
    );
}

fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids
}

#[tokio::test]
async fn governments_can_be_renamed_and_deleted() {
    let (engine, _db) = engine_with_db().await;
    let id = engine.new_government("  Osaka ").await.unwrap();
    assert_eq!(engine.government(id).await.unwrap().name, "Osaka");

    engine.rename_government(id, "Osaka Prefecture").await.unwrap();
    let government = engine.government(id).await.unwrap();
    assert_eq!(government.name, "Osaka Prefecture");
    assert!(government.updated_at >= government.created_at);

    assert!(matches!(
        engine.rename_government(id, " ").await.unwrap_err(),
        EngineError::InvalidName(_)
    ));

    engine.delete_government(id).await.unwrap();
    assert_eq!(
        engine.government(id).await.unwrap_err(),
        EngineError::NotFound(format!("government {id}"))
    );
    assert_eq!(
        engine.delete_government(id).await.unwrap_err(),
        EngineError::NotFound(format!("government {id}"))
    );
}
