// Mirrors the DDL in `db::migrations`.

diesel::table! {
    tasks (id) {
        id -> Text,
        name -> Text,
        kind -> Integer,
        status -> Integer,
        user_id -> Text,
        template_id -> Nullable<Text>,
        group_id -> Nullable<Text>,
        image_url -> Nullable<Text>,
        is_deleted -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    task_results (id) {
        id -> Text,
        task_id -> Text,
        is_success -> Bool,
        summary -> Text,
        description -> Text,
        data_points -> Text,
        table_data -> Text,
        generated_code -> Nullable<Text>,
        integration_doc -> Nullable<Text>,
        rendered_template -> Nullable<Text>,
        error_message -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    templates (id) {
        id -> Text,
        name -> Text,
        language -> Text,
        content -> Text,
        is_system -> Bool,
        user_id -> Nullable<Text>,
        is_deleted -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    chart_groups (id) {
        id -> Text,
        name -> Text,
        user_id -> Text,
        parent_id -> Nullable<Text>,
        is_deleted -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(task_results -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, task_results, templates, chart_groups,);
