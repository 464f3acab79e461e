// Privacy System - Access control for reads and mutations
// Rules are evaluated in priority order; the first non-skip answer wins

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::EntityType;

/// Privacy rule context for access control decisions
#[derive(Debug, Clone)]
pub struct PrivacyContext {
    pub entity_type: EntityType,
    pub operation: PrivacyOperation,
    pub viewer_id: Option<i64>,
    /// Author of the entity being touched.
    pub owner_id: Option<i64>,
    /// Author of the enclosing entity, e.g. the post a comment sits under.
    pub parent_owner_id: Option<i64>,
}

impl PrivacyContext {
    pub fn new(entity_type: EntityType, operation: PrivacyOperation, viewer_id: Option<i64>) -> Self {
        Self {
            entity_type,
            operation,
            viewer_id,
            owner_id: None,
            parent_owner_id: None,
        }
    }

    pub fn owned_by(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn under_parent_owned_by(mut self, parent_owner_id: i64) -> Self {
        self.parent_owner_id = Some(parent_owner_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyOperation {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyResult {
    Allow,
    Deny,
    Skip,
}

#[async_trait]
pub trait PrivacyRule: Send + Sync {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult>;

    fn name(&self) -> &str;

    fn operations(&self) -> Vec<PrivacyOperation>;

    /// Higher is evaluated first.
    fn priority(&self) -> i32;
}

#[derive(Default)]
pub struct PrivacyPolicy {
    rules: HashMap<EntityType, Vec<Box<dyn PrivacyRule>>>,
}

impl PrivacyPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_rule(&mut self, entity_type: EntityType, rule: Box<dyn PrivacyRule>) {
        let rules = self.rules.entry(entity_type).or_default();
        rules.push(rule);
        rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Default deny when no rule answers.
    pub async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        if let Some(rules) = self.rules.get(&ctx.entity_type) {
            for rule in rules {
                if !rule.operations().contains(&ctx.operation) {
                    continue;
                }
                match rule.evaluate(ctx).await? {
                    PrivacyResult::Skip => continue,
                    decided => {
                        tracing::debug!(
                            rule = rule.name(),
                            entity = ctx.entity_type.as_str(),
                            "privacy decision {:?}",
                            decided
                        );
                        return Ok(decided);
                    }
                }
            }
        }
        Ok(PrivacyResult::Deny)
    }

    pub async fn allows(&self, ctx: &PrivacyContext) -> AppResult<bool> {
        Ok(self.evaluate(ctx).await? == PrivacyResult::Allow)
    }
}

/// Anyone, signed in or not, may read.
pub struct PublicReadRule;

#[async_trait]
impl PrivacyRule for PublicReadRule {
    async fn evaluate(&self, _ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        Ok(PrivacyResult::Allow)
    }

    fn name(&self) -> &str {
        "public_read"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Read]
    }

    fn priority(&self) -> i32 {
        100
    }
}

pub struct AuthenticatedCreateRule;

#[async_trait]
impl PrivacyRule for AuthenticatedCreateRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        if ctx.viewer_id.is_some() {
            Ok(PrivacyResult::Allow)
        } else {
            Ok(PrivacyResult::Deny)
        }
    }

    fn name(&self) -> &str {
        "authenticated_create"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Create]
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Owner-only rule - only the author can modify
pub struct OwnerOnlyRule;

#[async_trait]
impl PrivacyRule for OwnerOnlyRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match (ctx.viewer_id, ctx.owner_id) {
            (Some(viewer), Some(owner)) if viewer == owner => Ok(PrivacyResult::Allow),
            _ => Ok(PrivacyResult::Deny),
        }
    }

    fn name(&self) -> &str {
        "owner_only"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Update, PrivacyOperation::Delete]
    }

    fn priority(&self) -> i32 {
        200
    }
}

/// The author of the enclosing post may delete anything under it.
pub struct ParentOwnerDeleteRule;

#[async_trait]
impl PrivacyRule for ParentOwnerDeleteRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match (ctx.viewer_id, ctx.parent_owner_id) {
            (Some(viewer), Some(parent_owner)) if viewer == parent_owner => Ok(PrivacyResult::Allow),
            _ => Ok(PrivacyResult::Skip),
        }
    }

    fn name(&self) -> &str {
        "parent_owner_delete"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Delete]
    }

    fn priority(&self) -> i32 {
        300
    }
}

pub fn create_default_privacy_policy() -> PrivacyPolicy {
    let mut policy = PrivacyPolicy::new();

    for entity_type in [EntityType::Post, EntityType::Comment, EntityType::Group, EntityType::User] {
        policy.register_rule(entity_type, Box::new(PublicReadRule));
    }

    for entity_type in [EntityType::Post, EntityType::Comment, EntityType::Follow] {
        policy.register_rule(entity_type, Box::new(AuthenticatedCreateRule));
    }
    for entity_type in [EntityType::Post, EntityType::Comment] {
        policy.register_rule(entity_type, Box::new(OwnerOnlyRule));
    }

    policy.register_rule(EntityType::Comment, Box::new(ParentOwnerDeleteRule));

    policy
}
