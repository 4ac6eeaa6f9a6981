diesel::table! {
    counselor_profiles (user_id) {
        user_id -> Uuid,
        name -> Text,
        availability_schedule -> Jsonb,
        current_availability -> Bool,
    }
}

diesel::table! {
    appointments (id) {
        id -> Uuid,
        counselor_user_id -> Uuid,
        student_user_id -> Uuid,
        start_time -> Timestamp,
        end_time -> Timestamp,
        mode -> Text,
        status -> Text,
    }
}

diesel::joinable!(appointments -> counselor_profiles (counselor_user_id));
diesel::allow_tables_to_appear_in_same_query!(appointments, counselor_profiles);
