//! Friend discovery over shared route memberships.
//!
//! Friendship is never stored; two users are friends while they share at
//! least one route.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use utoipa::ToSchema;

use super::route::RouteName;
use super::user::Username;

/// A user together with the names of the routes linked to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoutes {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub routes: BTreeSet<RouteName>,
}

/// What a user has in common with one friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = Vec<String>)]
    pub common_routes: Vec<RouteName>,
}

/// Sorted intersection of two route sets.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use routeshare::domain::{RouteName, common_routes};
///
/// let a: BTreeSet<_> = ["x", "y"].into_iter().map(|n| RouteName::new(n).unwrap()).collect();
/// let b: BTreeSet<_> = ["y", "z"].into_iter().map(|n| RouteName::new(n).unwrap()).collect();
/// assert_eq!(common_routes(&a, &b), common_routes(&b, &a));
/// ```
pub fn common_routes(a: &BTreeSet<RouteName>, b: &BTreeSet<RouteName>) -> Vec<RouteName> {
    a.intersection(b).cloned().collect()
}

/// Every other user sharing at least one route with `user`, keyed by username.
pub fn discover_friends(
    user: &UserRoutes,
    others: &[UserRoutes],
) -> BTreeMap<Username, FriendSummary> {
    others
        .iter()
        .filter(|other| other.username != user.username)
        .filter_map(|other| {
            let shared = common_routes(&user.routes, &other.routes);
            (!shared.is_empty()).then(|| {
                (
                    other.username.clone(),
                    FriendSummary {
                        first_name: other.first_name.clone(),
                        last_name: other.last_name.clone(),
                        common_routes: shared,
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn user(name: &str, routes: &[&str]) -> UserRoutes {
        UserRoutes {
            username: Username::new(name).expect("username"),
            first_name: format!("{name}_first"),
            last_name: format!("{name}_last"),
            routes: routes
                .iter()
                .map(|r| RouteName::new(r).expect("route name"))
                .collect(),
        }
    }

    #[fixture]
    fn community() -> Vec<UserRoutes> {
        vec![
            user("ana", &["castle", "beach", "market"]),
            user("luis", &["beach", "market"]),
            user("marta", &["port"]),
            user("pablo", &["castle"]),
        ]
    }

    #[rstest]
    fn common_routes_are_sorted_and_symmetric(community: Vec<UserRoutes>) {
        let ab = common_routes(&community[0].routes, &community[1].routes);
        let ba = common_routes(&community[1].routes, &community[0].routes);
        assert_eq!(ab, ba);
        let names: Vec<_> = ab.iter().map(AsRef::as_ref).collect();
        assert_eq!(names, vec!["beach", "market"]);
    }

    #[rstest]
    fn discovers_users_sharing_routes(community: Vec<UserRoutes>) {
        let friends = discover_friends(&community[0], &community);
        let usernames: Vec<_> = friends.keys().map(AsRef::as_ref).collect();
        assert_eq!(usernames, vec!["luis", "pablo"]);
        let luis = &friends[&community[1].username];
        assert_eq!(luis.first_name, "luis_first");
        assert_eq!(luis.common_routes.len(), 2);
    }

    #[rstest]
    fn friendship_is_mutual(community: Vec<UserRoutes>) {
        for a in &community {
            for b in &community {
                let a_sees_b = discover_friends(a, &community).contains_key(&b.username);
                let b_sees_a = discover_friends(b, &community).contains_key(&a.username);
                assert_eq!(a_sees_b, b_sees_a, "{} vs {}", a.username, b.username);
            }
        }
    }

    #[rstest]
    fn user_without_shared_routes_has_no_friends(community: Vec<UserRoutes>) {
        assert!(discover_friends(&community[2], &community).is_empty());
    }

    #[rstest]
    fn serialises_friend_summary() {
        let summary = FriendSummary {
            first_name: "Luis".into(),
            last_name: "Pérez".into(),
            common_routes: vec![RouteName::new("beach").expect("name")],
        };
        let value = serde_json::to_value(summary).expect("serialises");
        assert_eq!(value["commonRoutes"][0], "beach");
        assert_eq!(value["firstName"], "Luis");
    }
}
