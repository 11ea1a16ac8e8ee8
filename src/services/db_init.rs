use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

use crate::{
    error::StoreError,
    store::mongo::{LEADERBOARD, THRESHOLDS, TRACKED_SYMBOLS},
};

pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    // tracked_symbols: unique per (scope_id, owner_id, symbol)
    {
        let col = db.collection::<mongodb::bson::Document>(TRACKED_SYMBOLS);
        let model = IndexModel::builder()
            .keys(doc! { "scope_id": 1, "owner_id": 1, "symbol": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // thresholds: one per (owner_id, scope_id)
    {
        let col = db.collection::<mongodb::bson::Document>(THRESHOLDS);
        let model = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "scope_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // leaderboard: standings query (date + scope, sorted by score)
    {
        let col = db.collection::<mongodb::bson::Document>(LEADERBOARD);
        let model = IndexModel::builder()
            .keys(doc! { "date": 1, "scope_id": 1, "score": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
