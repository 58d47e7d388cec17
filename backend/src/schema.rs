//! Diesel table definitions, kept in step with `migrations/`.

diesel::table! {
    appointments (id) {
        id -> Integer,
        patient_id -> Integer,
        doctor_id -> Integer,
        description -> Nullable<Text>,
        date -> Timestamp,
        date_created -> Timestamp,
        approved -> Bool,
    }
}

diesel::table! {
    tokens (key) {
        key -> Text,
        user_id -> Integer,
        created -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password_hash -> Text,
        email -> Text,
        first_name -> Text,
        last_name -> Text,
        phone -> Nullable<Text>,
        address -> Nullable<Text>,
        is_doctor -> Bool,
        is_patient -> Bool,
        is_active -> Bool,
        is_staff -> Bool,
        is_superuser -> Bool,
        last_login -> Nullable<Timestamp>,
        date_joined -> Timestamp,
    }
}

diesel::joinable!(tokens -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(appointments, tokens, users,);
