table! {
    consumption (id) {
        id -> Integer,
        wine_id -> Nullable<Integer>,
        wine_name -> Text,
        consumed_at -> Timestamp,
        quantity -> Integer,
        rating -> Nullable<Text>,
        tasting_notes -> Nullable<Text>,
        experience_notes -> Nullable<Text>,
    }
}

table! {
    schema_migrations (version) {
        version -> Integer,
        name -> Text,
        applied_at -> Timestamp,
    }
}

table! {
    wine (id) {
        id -> Integer,
        name -> Text,
        varietal -> Nullable<Text>,
        region -> Nullable<Text>,
        vintage -> Nullable<Integer>,
        quantity -> Integer,
        status -> Text,
        price_paid -> Nullable<Text>,
        purchase_location -> Nullable<Text>,
        notes -> Nullable<Text>,
        tasting_notes -> Nullable<Text>,
        experience_notes -> Nullable<Text>,
        rating -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

joinable!(consumption -> wine (wine_id));

allow_tables_to_appear_in_same_query!(consumption, schema_migrations, wine,);
