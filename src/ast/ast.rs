use std::fmt::{self, Display};

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

/// Stable index of a node inside its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Function,
    Parameters,
    Parameter,
    Type,
    Declaration,
    Declarator,
    Block,
    If,
    While,
    DoWhile,
    For,
    Switch,
    CaseList,
    Case,
    Default,
    Break,
    Continue,
    Return,
    ExpressionStmt,
    /// Empty statement, or an absent optional child.
    Empty,
    Assignment,
    BinaryOp,
    UnaryOp,
    Ternary,
    Call,
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    None,
    Int(i64),
    Float(f64),
    Text(String),
    /// Decoded string literal contents, without the terminating NUL
    Bytes(Vec<u8>),
    Operator(TokenKind),
    Type(TokenKind),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub value: LeafValue,
    pub position: Position,
}

pub struct FunctionParts<'a> {
    pub name: &'a str,
    pub return_type: NodeId,
    pub params: &'a [NodeId],
    pub body: Option<NodeId>,
}

pub struct DeclarationParts<'a> {
    pub type_node: NodeId,
    pub declarators: &'a [NodeId],
}

pub struct IfParts {
    pub condition: NodeId,
    pub then_branch: NodeId,
    pub else_branch: Option<NodeId>,
}

pub struct LoopParts {
    pub condition: NodeId,
    pub body: NodeId,
}

pub struct ForParts {
    pub init: Option<NodeId>,
    pub condition: Option<NodeId>,
    pub increment: Option<NodeId>,
    pub body: NodeId,
}

pub struct SwitchParts<'a> {
    pub scrutinee: NodeId,
    pub clauses: &'a [NodeId],
}

/// A `case` clause has a label; `default` has none.
pub struct CaseParts<'a> {
    pub label: Option<NodeId>,
    pub body: &'a [NodeId],
}

/// Arena holding every node of one translation unit.
///
/// Nodes are only ever appended, so a [`NodeId`] stays valid for the
/// lifetime of the tree, and the whole tree is dropped at once. The shape
/// constructors below fix each construct's child layout; the matching
/// `*_parts` views hand those children back by name.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn add(
        &mut self,
        kind: NodeKind,
        value: LeafValue,
        children: Vec<NodeId>,
        position: Position,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            children,
            value,
            position,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.node(id).position
    }

    pub fn text(&self, id: NodeId) -> &str {
        match &self.node(id).value {
            LeafValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn bytes(&self, id: NodeId) -> &[u8] {
        match &self.node(id).value {
            LeafValue::Bytes(bytes) => bytes,
            _ => &[],
        }
    }

    pub fn operator(&self, id: NodeId) -> Option<TokenKind> {
        match self.node(id).value {
            LeafValue::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn type_token(&self, id: NodeId) -> Option<TokenKind> {
        match self.node(id).value {
            LeafValue::Type(kind) => Some(kind),
            _ => None,
        }
    }

    /// `None` for an `Empty` placeholder, the node otherwise.
    pub fn optional(&self, id: NodeId) -> Option<NodeId> {
        (self.kind(id) != NodeKind::Empty).then_some(id)
    }

    /// Top-level functions of the program, in source order.
    pub fn functions(&self) -> &[NodeId] {
        match self.root {
            Some(root) => self.children(root),
            None => &[],
        }
    }

    // Shape constructors

    pub fn program(&mut self, functions: Vec<NodeId>, position: Position) -> NodeId {
        let id = self.add(NodeKind::Program, LeafValue::None, functions, position);
        self.root = Some(id);
        id
    }

    pub fn function(
        &mut self,
        name: String,
        return_type: NodeId,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        position: Position,
    ) -> NodeId {
        let params = self.add(NodeKind::Parameters, LeafValue::None, params, position);
        let body = body.unwrap_or_else(|| self.empty(position));
        self.add(
            NodeKind::Function,
            LeafValue::Text(name),
            vec![return_type, params, body],
            position,
        )
    }

    pub fn parameter(&mut self, name: String, type_node: NodeId, position: Position) -> NodeId {
        self.add(
            NodeKind::Parameter,
            LeafValue::Text(name),
            vec![type_node],
            position,
        )
    }

    pub fn type_specifier(&mut self, kind: TokenKind, position: Position) -> NodeId {
        self.add(NodeKind::Type, LeafValue::Type(kind), vec![], position)
    }

    pub fn declaration(
        &mut self,
        type_node: NodeId,
        declarators: Vec<NodeId>,
        position: Position,
    ) -> NodeId {
        let mut children = vec![type_node];
        children.extend(declarators);
        self.add(NodeKind::Declaration, LeafValue::None, children, position)
    }

    pub fn declarator(
        &mut self,
        name: String,
        initializer: Option<NodeId>,
        position: Position,
    ) -> NodeId {
        self.add(
            NodeKind::Declarator,
            LeafValue::Text(name),
            initializer.into_iter().collect(),
            position,
        )
    }

    pub fn block(&mut self, statements: Vec<NodeId>, position: Position) -> NodeId {
        self.add(NodeKind::Block, LeafValue::None, statements, position)
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        position: Position,
    ) -> NodeId {
        let else_branch = else_branch.unwrap_or_else(|| self.empty(position));
        self.add(
            NodeKind::If,
            LeafValue::None,
            vec![condition, then_branch, else_branch],
            position,
        )
    }

    pub fn while_stmt(&mut self, condition: NodeId, body: NodeId, position: Position) -> NodeId {
        self.add(
            NodeKind::While,
            LeafValue::None,
            vec![condition, body],
            position,
        )
    }

    pub fn do_while(&mut self, body: NodeId, condition: NodeId, position: Position) -> NodeId {
        self.add(
            NodeKind::DoWhile,
            LeafValue::None,
            vec![body, condition],
            position,
        )
    }

    pub fn for_stmt(
        &mut self,
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
        position: Position,
    ) -> NodeId {
        let clause = |ast: &mut Ast, node: Option<NodeId>| {
            node.unwrap_or_else(|| ast.empty(position))
        };
        let init = clause(self, init);
        let condition = clause(self, condition);
        let increment = clause(self, increment);
        self.add(
            NodeKind::For,
            LeafValue::None,
            vec![init, condition, increment, body],
            position,
        )
    }

    pub fn switch(&mut self, scrutinee: NodeId, clauses: Vec<NodeId>, position: Position) -> NodeId {
        let clauses = self.add(NodeKind::CaseList, LeafValue::None, clauses, position);
        self.add(
            NodeKind::Switch,
            LeafValue::None,
            vec![scrutinee, clauses],
            position,
        )
    }

    pub fn case(&mut self, label: NodeId, body: Vec<NodeId>, position: Position) -> NodeId {
        let mut children = vec![label];
        children.extend(body);
        self.add(NodeKind::Case, LeafValue::None, children, position)
    }

    pub fn default_case(&mut self, body: Vec<NodeId>, position: Position) -> NodeId {
        self.add(NodeKind::Default, LeafValue::None, body, position)
    }

    pub fn return_stmt(&mut self, value: Option<NodeId>, position: Position) -> NodeId {
        self.add(
            NodeKind::Return,
            LeafValue::None,
            value.into_iter().collect(),
            position,
        )
    }

    pub fn expression_stmt(&mut self, expression: NodeId, position: Position) -> NodeId {
        self.add(
            NodeKind::ExpressionStmt,
            LeafValue::None,
            vec![expression],
            position,
        )
    }

    pub fn leaf(&mut self, kind: NodeKind, value: LeafValue, position: Position) -> NodeId {
        self.add(kind, value, vec![], position)
    }

    pub fn empty(&mut self, position: Position) -> NodeId {
        self.leaf(NodeKind::Empty, LeafValue::None, position)
    }

    pub fn assignment(
        &mut self,
        operator: TokenKind,
        target: NodeId,
        value: NodeId,
        position: Position,
    ) -> NodeId {
        self.add(
            NodeKind::Assignment,
            LeafValue::Operator(operator),
            vec![target, value],
            position,
        )
    }

    pub fn binary(
        &mut self,
        operator: TokenKind,
        left: NodeId,
        right: NodeId,
        position: Position,
    ) -> NodeId {
        self.add(
            NodeKind::BinaryOp,
            LeafValue::Operator(operator),
            vec![left, right],
            position,
        )
    }

    pub fn unary(&mut self, operator: TokenKind, operand: NodeId, position: Position) -> NodeId {
        self.add(
            NodeKind::UnaryOp,
            LeafValue::Operator(operator),
            vec![operand],
            position,
        )
    }

    pub fn ternary(
        &mut self,
        condition: NodeId,
        then_value: NodeId,
        else_value: NodeId,
        position: Position,
    ) -> NodeId {
        self.add(
            NodeKind::Ternary,
            LeafValue::None,
            vec![condition, then_value, else_value],
            position,
        )
    }

    pub fn call(&mut self, callee: String, arguments: Vec<NodeId>, position: Position) -> NodeId {
        self.add(
            NodeKind::Call,
            LeafValue::Text(callee),
            arguments,
            position,
        )
    }

    // Named views

    fn expect_shape(&self, id: NodeId, kind: NodeKind, arity: usize) -> Result<&[NodeId], Error> {
        let node = self.node(id);
        if node.kind != kind || node.children.len() < arity {
            return Err(Error::new(
                ErrorImpl::MalformedTree {
                    message: format!(
                        "expected {:?} with {} children, found {:?} with {}",
                        kind,
                        arity,
                        node.kind,
                        node.children.len()
                    ),
                },
                node.position,
            ));
        }
        Ok(&node.children)
    }

    pub fn function_parts(&self, id: NodeId) -> Result<FunctionParts<'_>, Error> {
        let children = self.expect_shape(id, NodeKind::Function, 3)?;
        Ok(FunctionParts {
            name: self.text(id),
            return_type: children[0],
            params: self.children(children[1]),
            body: self.optional(children[2]),
        })
    }

    pub fn declaration_parts(&self, id: NodeId) -> Result<DeclarationParts<'_>, Error> {
        let children = self.expect_shape(id, NodeKind::Declaration, 1)?;
        Ok(DeclarationParts {
            type_node: children[0],
            declarators: &children[1..],
        })
    }

    pub fn if_parts(&self, id: NodeId) -> Result<IfParts, Error> {
        let children = self.expect_shape(id, NodeKind::If, 3)?;
        Ok(IfParts {
            condition: children[0],
            then_branch: children[1],
            else_branch: self.optional(children[2]),
        })
    }

    pub fn while_parts(&self, id: NodeId) -> Result<LoopParts, Error> {
        let children = self.expect_shape(id, NodeKind::While, 2)?;
        Ok(LoopParts {
            condition: children[0],
            body: children[1],
        })
    }

    pub fn do_while_parts(&self, id: NodeId) -> Result<LoopParts, Error> {
        let children = self.expect_shape(id, NodeKind::DoWhile, 2)?;
        Ok(LoopParts {
            body: children[0],
            condition: children[1],
        })
    }

    pub fn for_parts(&self, id: NodeId) -> Result<ForParts, Error> {
        let children = self.expect_shape(id, NodeKind::For, 4)?;
        Ok(ForParts {
            init: self.optional(children[0]),
            condition: self.optional(children[1]),
            increment: self.optional(children[2]),
            body: children[3],
        })
    }

    pub fn switch_parts(&self, id: NodeId) -> Result<SwitchParts<'_>, Error> {
        let children = self.expect_shape(id, NodeKind::Switch, 2)?;
        Ok(SwitchParts {
            scrutinee: children[0],
            clauses: self.children(children[1]),
        })
    }

    pub fn case_parts(&self, id: NodeId) -> Result<CaseParts<'_>, Error> {
        match self.kind(id) {
            NodeKind::Default => Ok(CaseParts {
                label: None,
                body: self.children(id),
            }),
            _ => {
                let children = self.expect_shape(id, NodeKind::Case, 1)?;
                Ok(CaseParts {
                    label: Some(children[0]),
                    body: &children[1..],
                })
            }
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        let node = self.node(id);
        write!(f, "{:width$}{:?}", "", node.kind, width = indent * 2)?;

        match &node.value {
            LeafValue::None => {}
            LeafValue::Int(value) => write!(f, ": {}", value)?,
            LeafValue::Float(value) => write!(f, ": {}", value)?,
            LeafValue::Text(text) => write!(f, ": {}", text)?,
            LeafValue::Bytes(bytes) => write!(f, ": {:?}", String::from_utf8_lossy(bytes))?,
            LeafValue::Operator(op) => write!(f, " ({})", op.symbol())?,
            LeafValue::Type(kind) => write!(f, ": {}", kind.to_string().to_lowercase())?,
        }
        writeln!(f)?;

        for child in &node.children {
            self.fmt_node(f, *child, indent + 1)?;
        }
        Ok(())
    }
}

impl Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_node(f, root, 0),
            None => Ok(()),
        }
    }
}
