//! Diesel schema for board persistence.

diesel::table! {
    /// Task cards.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Display title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Due date.
        due_date -> Date,
        /// Lane name.
        #[max_length = 32]
        lane -> Varchar,
        /// Completion percentage.
        progress -> Int2,
        /// Position within the lane.
        rank -> Int4,
        /// Mutation counter.
        version -> Int8,
        /// Creator profile.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Links between tasks and assigned profiles.
    task_assignees (task_id, user_id) {
        /// Assigned task.
        task_id -> Uuid,
        /// Assigned profile.
        user_id -> Uuid,
    }
}

diesel::table! {
    /// User directory.
    profiles (id) {
        /// Profile identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        full_name -> Varchar,
    }
}

diesel::joinable!(task_assignees -> tasks (task_id));
diesel::joinable!(task_assignees -> profiles (user_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, task_assignees, profiles);
